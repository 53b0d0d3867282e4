//! The merge run: discover → normalize → merge → export → count.
//!
//! All intermediate PDFs live in a temporary workspace that is removed when
//! [`Pipeline::run`] returns, whatever the outcome.

use crate::audit::AuditLog;
use crate::discover::{digest_file, discover_input_files};
use crate::error::{PipelineError, Result};
use crate::extractor::LopdfExtractor;
use crate::merge::merge_pdfs;
use crate::models::{PipelineReport, SearchWord};
use crate::normalize::ensure_pdf_format;
use crate::progress::{NoopProgress, StageProgress};
use crate::traits::{DocumentExporter, DocumentRenderer};
use crate::wordcount::count_word_frequency;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

pub const MERGED_PDF_NAME: &str = "merged.pdf";

pub struct Pipeline<R, X>
where
    R: DocumentRenderer,
    X: DocumentExporter,
{
    renderer: R,
    exporter: X,
    extractor: LopdfExtractor,
    progress: Box<dyn StageProgress>,
    temp_root: Option<PathBuf>,
}

impl<R, X> Pipeline<R, X>
where
    R: DocumentRenderer,
    X: DocumentExporter,
{
    pub fn new(renderer: R, exporter: X) -> Self {
        Self {
            renderer,
            exporter,
            extractor: LopdfExtractor,
            progress: Box::new(NoopProgress),
            temp_root: None,
        }
    }

    /// Reports conversion, merge and word-count progress to `progress`.
    pub fn with_progress(mut self, progress: impl StageProgress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Creates the per-run workspace under `root` instead of the system
    /// temporary directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Runs the whole pipeline for `source_dir`, writing the final document
    /// to `output`.
    ///
    /// `collect_words` is called once the document has been exported; an
    /// empty list skips word counting. Failures are logged to `audit` and
    /// returned.
    pub fn run<F>(
        &self,
        source_dir: &Path,
        output: &Path,
        audit: &mut AuditLog,
        collect_words: F,
    ) -> Result<PipelineReport>
    where
        F: FnOnce(&mut AuditLog) -> Vec<SearchWord>,
    {
        audit.record(format!("Analysis started for input directory: {}", source_dir.display()));

        let result = self.execute(source_dir, output, audit, collect_words);
        match &result {
            Ok(report) => {
                info!(output = %report.output_path.display(), pages = report.merged_page_count, "pipeline finished");
                audit.record(format!("Merged document saved as {}", report.output_path.display()));
            }
            Err(PipelineError::NoInputFiles(_)) => {}
            Err(error) => {
                warn!(kind = ?error.kind(), %error, "pipeline stopped");
                audit.record(format!("An error occurred: {error}"));
            }
        }

        result
    }

    fn create_workspace(&self) -> Result<TempDir> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("docmerge-");
            builder
        };

        let workspace = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        workspace.map_err(|error| PipelineError::Workspace(error.to_string()))
    }

    fn execute<F>(
        &self,
        source_dir: &Path,
        output: &Path,
        audit: &mut AuditLog,
        collect_words: F,
    ) -> Result<PipelineReport>
    where
        F: FnOnce(&mut AuditLog) -> Vec<SearchWord>,
    {
        if !source_dir.is_dir() {
            return Err(PipelineError::InvalidSource(source_dir.to_path_buf()));
        }

        let workspace = self.create_workspace()?;
        info!(workspace = %workspace.path().display(), "workspace created");

        let inputs = discover_input_files(source_dir);
        if inputs.is_empty() {
            audit.record("No DOC, DOCX, or PDF files found in the directory.");
            return Err(PipelineError::NoInputFiles(source_dir.to_path_buf()));
        }

        for input in &inputs {
            match digest_file(&input.path) {
                Ok(digest) => audit.record(format!("Input {} sha256={digest}", input.path.display())),
                Err(error) => warn!(path = %input.path.display(), %error, "could not fingerprint input"),
            }
        }

        audit.record("Ensuring all files are in PDF format...");
        let normalization = ensure_pdf_format(&inputs, workspace.path(), &self.renderer, audit, self.progress.as_ref());
        if normalization.pdfs.is_empty() {
            return Err(PipelineError::NothingToMerge);
        }

        audit.record("Merging PDF files...");
        let merged = merge_pdfs(
            &normalization.pdfs,
            &workspace.path().join(MERGED_PDF_NAME),
            self.progress.as_ref(),
        )?;
        audit.record(format!(
            "Merged {} PDF files into {} pages",
            normalization.pdfs.len(),
            merged.page_count
        ));

        audit.record("Converting merged PDF to DOCX...");
        self.exporter.export(&merged.path, output)?;

        let words = collect_words(audit);
        let word_counts = if words.is_empty() {
            None
        } else {
            let counts = count_word_frequency(&merged.path, &words, &self.extractor, self.progress.as_ref())?;
            audit.record("Word Frequency Results:");
            for tally in counts.iter() {
                audit.record(format!("'{}': {} occurrences", tally.word, tally.count));
            }
            Some(counts)
        };

        Ok(PipelineReport {
            source_dir: source_dir.to_path_buf(),
            inputs,
            normalization,
            merged_page_count: merged.page_count,
            output_path: output.to_path_buf(),
            word_counts,
        })
    }
}

/// Confirms the output document exists after a run.
pub fn verify_output(output: &Path) -> Result<()> {
    if output.is_file() {
        Ok(())
    } else {
        Err(PipelineError::OutputMissing(output.to_path_buf()))
    }
}
