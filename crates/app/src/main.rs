mod progress;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, ValueEnum};
use crate::progress::TerminalProgress;
use docmerge_core::{
    verify_output, AuditLog, AuditSession, DocumentExporter, DocxExporter, LopdfExtractor, OfficeExporter,
    OfficeRenderer, Pipeline, PipelineReport, SearchWord, DEFAULT_OFFICE_PROGRAM, DOCUMENT_EXTENSION,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const BANNER_WIDTH: usize = 78;
const TITLE: &str = "Document Merger, Converter, and Word Counter";

#[derive(Parser)]
#[command(name = "docmerge", version, about)]
struct Cli {
    /// Folder containing the DOC, DOCX and PDF files to merge. Prompted for when absent.
    #[arg(long, env = "DOCMERGE_SOURCE")]
    source: Option<PathBuf>,

    /// Name of the final DOCX file. Prompted for when absent.
    #[arg(long, env = "DOCMERGE_OUTPUT")]
    output: Option<String>,

    /// Word to count in the merged document. Repeat for several words.
    #[arg(long = "word")]
    words: Vec<String>,

    /// Directory receiving the final document and audit_log.txt.
    #[arg(long, env = "DOCMERGE_DOCUMENTS_DIR")]
    documents_dir: Option<PathBuf>,

    /// Office suite executable used for document conversions.
    #[arg(long, env = "DOCMERGE_OFFICE", default_value = DEFAULT_OFFICE_PROGRAM)]
    office_program: PathBuf,

    /// How the merged PDF is turned back into a DOCX.
    #[arg(long, value_enum, default_value_t = ExporterChoice::Native)]
    exporter: ExporterChoice,

    /// Parent directory for the temporary workspace.
    #[arg(long, env = "DOCMERGE_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Write a JSON summary of the run to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Do not draw progress bars.
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Do not wait for Enter before starting and before exiting.
    #[arg(long, default_value_t = false)]
    no_pause: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExporterChoice {
    /// Rebuild the document from the PDF text layer.
    Native,
    /// Let the office suite import the PDF.
    Office,
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    info!(version = app_version, started_at = %Local::now().to_rfc3339(), "docmerge boot");

    let documents_dir = resolve_documents_dir(cli.documents_dir.clone())?;

    let mut session = AuditSession::start(AuditLog::new());
    session.persist_in(&documents_dir);

    display_intro(session.log());
    if !cli.no_pause {
        pause("Press Enter to begin...")?;
    }

    let source = match &cli.source {
        Some(source) => source.clone(),
        None => PathBuf::from(prompt("Enter the path to the folder containing the files: ")?),
    };

    if !source.is_dir() {
        session.log().record("The provided path is not a valid directory.");
    } else {
        let name = match &cli.output {
            Some(name) => name.clone(),
            None => prompt("Enter the name for the final output DOCX file (e.g., final_document.docx): ")?,
        };
        let output = resolve_output_path(&documents_dir, &name);
        if let Some(parent) = output.parent() {
            session.persist_in(parent);
        }

        let result = match cli.exporter {
            ExporterChoice::Native => run(&cli, DocxExporter::<LopdfExtractor>::default(), &source, &output, session.log()),
            ExporterChoice::Office => run(
                &cli,
                OfficeExporter::new(OfficeRenderer::new(&cli.office_program)),
                &source,
                &output,
                session.log(),
            ),
        };

        session.log().record(format!("File should be saved at: {}", output.display()));
        match verify_output(&output) {
            Ok(()) => session.log().record("File successfully created!"),
            Err(error) => {
                warn!(%error, "output missing after run");
                session
                    .log()
                    .record("ERROR! File was not created. Please check the permissions and try again.");
            }
        }

        if let (Some(report_path), Ok(report)) = (&cli.report, &result) {
            match report.write_json(report_path) {
                Ok(()) => session.log().record(format!("Run report written to {}", report_path.display())),
                Err(error) => session.log().record(format!("Could not write run report: {error}")),
            }
        }
    }

    // Flushes audit_log.txt.
    drop(session);

    if !cli.no_pause {
        pause("\nPress Enter to close the window...")?;
    }

    Ok(())
}

fn run<X: DocumentExporter>(
    cli: &Cli,
    exporter: X,
    source: &Path,
    output: &Path,
    audit: &mut AuditLog,
) -> Result<PipelineReport, docmerge_core::PipelineError> {
    let mut pipeline = Pipeline::new(OfficeRenderer::new(&cli.office_program), exporter)
        .with_progress(TerminalProgress::new(!cli.no_progress));
    if let Some(temp_dir) = &cli.temp_dir {
        pipeline = pipeline.with_temp_root(temp_dir);
    }

    let preset = cli.words.clone();
    pipeline.run(source, output, audit, move |log| {
        if preset.is_empty() {
            read_search_words(log, io::stdin().lock())
        } else {
            collect_search_words(log, preset)
        }
    })
}

fn resolve_documents_dir(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .context("could not determine the Documents directory; pass --documents-dir")
}

/// Appends `.docx` when the name lacks it and places the file in `documents_dir`.
fn resolve_output_path(documents_dir: &Path, name: &str) -> PathBuf {
    let name = name.trim();
    let suffix = format!(".{DOCUMENT_EXTENSION}");
    let file_name = if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    };
    documents_dir.join(file_name)
}

fn collect_search_words(audit: &mut AuditLog, raw: Vec<String>) -> Vec<SearchWord> {
    let mut words = Vec::new();
    for word in raw.iter().filter_map(|word| SearchWord::parse(word)) {
        audit.record(format!("Added search word: {word}"));
        words.push(word);
    }
    words
}

/// Reads one word per line until a blank line or end of input.
fn read_search_words(audit: &mut AuditLog, input: impl BufRead) -> Vec<SearchWord> {
    audit.record("Enter words to search for (one per line). Press Enter on a blank line to finish:");

    let mut words = Vec::new();
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        let Some(word) = SearchWord::parse(&line) else {
            break;
        };
        audit.record(format!("Added search word: {word}"));
        words.push(word);
    }
    words
}

fn banner_lines() -> Vec<String> {
    let border = format!("+{}+", "-".repeat(BANNER_WIDTH));
    let body = [
        "",
        " This tool performs the following tasks:",
        " 1. Converts all DOC and DOCX files in a specified input folder to PDF format.",
        " 2. Merges all PDF files (including the newly converted ones) into one PDF.",
        " 3. Converts the merged PDF back into a DOCX file.",
        " 4. Counts the frequency of user-specified words in the merged document.",
        "    (Case-insensitive, whole-word matching)",
        " 5. Writes a timestamped audit log of all operations.",
        "",
        " You will be prompted for:",
        " 1. The input folder containing the files to be processed",
        " 2. The name of the final output DOCX file, e.g. merged_doc.docx",
        " 3. Words to search for in the final document",
        "",
        " The final DOCX file and audit log are saved in your Documents folder.",
        " The audit log (audit_log.txt) records every operation performed,",
        " including timestamps and any errors encountered.",
    ];

    let mut lines = vec![border.clone(), format!("|{TITLE:^BANNER_WIDTH$}|"), border.clone()];
    lines.extend(body.iter().map(|line| format!("|{line:<BANNER_WIDTH$}|")));
    lines.push(border);
    lines
}

fn display_intro(audit: &mut AuditLog) {
    for line in banner_lines() {
        audit.record(line);
    }
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).context("failed to read from stdin")?;
    Ok(answer.trim().to_string())
}

fn pause(message: &str) -> anyhow::Result<()> {
    prompt(message).map(|_| ())
}
