use crate::{PdfFile, PipelineError};
use std::path::Path;

/// Renders one word-processor document to PDF inside `output_dir`.
///
/// The produced file is named after the input's base name with a `.pdf`
/// extension. Implementations release whatever session they open before
/// returning.
pub trait DocumentRenderer {
    fn render_to_pdf(&self, document: &Path, output_dir: &Path) -> Result<PdfFile, PipelineError>;
}

/// Turns a PDF back into an editable document at `output`.
pub trait DocumentExporter {
    fn export(&self, pdf: &Path, output: &Path) -> Result<(), PipelineError>;
}
