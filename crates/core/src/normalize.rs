use crate::audit::AuditLog;
use crate::models::{DocumentKind, InputFile, NormalizationReport, PdfFile, SkippedFile};
use crate::progress::{Stage, StageProgress};
use crate::traits::DocumentRenderer;
use std::path::Path;
use tracing::{info, warn};

/// Makes sure every input is represented by a PDF, in input order.
///
/// Word-processor documents are rendered into `workspace`, PDFs pass through
/// untouched and anything else is skipped. A file that fails to render is
/// logged and left out; the remaining files are still processed.
pub fn ensure_pdf_format<R>(
    files: &[InputFile],
    workspace: &Path,
    renderer: &R,
    audit: &mut AuditLog,
    progress: &dyn StageProgress,
) -> NormalizationReport
where
    R: DocumentRenderer + ?Sized,
{
    let mut report = NormalizationReport::default();
    progress.on_stage_start(Stage::Converting, files.len());

    for (index, file) in files.iter().enumerate() {
        info!(index, total = files.len(), path = %file.path.display(), kind = ?file.kind, "normalizing");

        match file.kind {
            DocumentKind::WordProcessor => match renderer.render_to_pdf(&file.path, workspace) {
                Ok(pdf) => {
                    audit.record(format!("Converted {} to PDF", file.path.display()));
                    report.pdfs.push(pdf);
                }
                Err(error) => {
                    warn!(path = %file.path.display(), %error, "conversion failed");
                    audit.record(format!("Error processing file {}: {error}", file.path.display()));
                    report.failed.push(SkippedFile {
                        path: file.path.clone(),
                        reason: error.to_string(),
                    });
                }
            },
            DocumentKind::Pdf => {
                audit.record(format!("Added existing PDF: {}", file.path.display()));
                report.pdfs.push(PdfFile::passthrough(file.path.clone()));
            }
            DocumentKind::Unsupported => {
                audit.record(format!("Skipping unsupported file format: {}", file.path.display()));
                report.skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason: "unsupported file format".to_string(),
                });
            }
        }
        progress.on_item_done(Stage::Converting);
    }

    progress.on_stage_finish(Stage::Converting);
    report
}
