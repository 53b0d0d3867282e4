//! Word-processor documents to PDF through a locally installed office suite.
//!
//! Each call starts one headless LibreOffice process for one document and
//! waits for it to exit. There is no timeout: a hung office process hangs the
//! run.

use crate::error::PipelineError;
use crate::models::PDF_EXTENSION;
use crate::traits::DocumentRenderer;
use crate::PdfFile;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

pub const DEFAULT_OFFICE_PROGRAM: &str = "soffice";

#[derive(Debug, Clone)]
pub struct OfficeRenderer {
    program: PathBuf,
}

impl Default for OfficeRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_OFFICE_PROGRAM)
    }
}

impl OfficeRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs the office program headless with the given conversion arguments.
    pub(crate) fn run(&self, args: &[&OsStr]) -> Result<Output, String> {
        debug!(program = %self.program.display(), ?args, "spawning office program");
        Command::new(&self.program)
            .arg("--headless")
            .arg("--norestore")
            .args(args)
            .output()
            .map_err(|error| format!("could not start {}: {error}", self.program.display()))
    }
}

pub(crate) fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("office program exited with {}", output.status)
    } else {
        format!("office program exited with {}: {stderr}", output.status)
    }
}

/// `<output_dir>/<stem>.pdf` for `document`.
pub fn pdf_output_path(document: &Path, output_dir: &Path) -> Result<PathBuf, PipelineError> {
    let stem = document.file_stem().ok_or_else(|| PipelineError::Conversion {
        path: document.to_path_buf(),
        reason: "path has no file name".to_string(),
    })?;

    let mut name = stem.to_os_string();
    name.push(".");
    name.push(PDF_EXTENSION);
    Ok(output_dir.join(name))
}

impl DocumentRenderer for OfficeRenderer {
    fn render_to_pdf(&self, document: &Path, output_dir: &Path) -> Result<PdfFile, PipelineError> {
        let conversion_error = |reason: String| PipelineError::Conversion {
            path: document.to_path_buf(),
            reason,
        };

        let expected = pdf_output_path(document, output_dir)?;
        let output = self
            .run(&[
                OsStr::new("--convert-to"),
                OsStr::new(PDF_EXTENSION),
                OsStr::new("--outdir"),
                output_dir.as_os_str(),
                document.as_os_str(),
            ])
            .map_err(conversion_error)?;

        if !output.status.success() {
            return Err(conversion_error(describe_failure(&output)));
        }

        if !expected.is_file() {
            return Err(conversion_error(format!(
                "office program reported success but {} was not written",
                expected.display()
            )));
        }

        info!(source = %document.display(), pdf = %expected.display(), "rendered document to pdf");
        Ok(PdfFile::converted(expected, document))
    }
}
