pub mod audit;
pub mod discover;
pub mod error;
pub mod export;
pub mod extractor;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod traits;
pub mod wordcount;

#[cfg(test)]
pub(crate) mod fixtures;

pub use audit::{AuditEntry, AuditLog, AuditSession, AUDIT_LOG_FILE_NAME};
pub use discover::{digest_file, discover_input_files};
pub use error::{ErrorKind, PipelineError};
pub use export::{DocxExporter, OfficeExporter};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use merge::{merge_pdf_paths, merge_pdfs, page_count};
pub use models::{
    DocumentKind, InputFile, MergedDocument, NormalizationReport, PdfFile, PdfOrigin, PipelineReport,
    SearchWord, SkippedFile, WordCounts, WordTally, DOCUMENT_EXTENSION,
};
pub use normalize::ensure_pdf_format;
pub use pipeline::{verify_output, Pipeline, MERGED_PDF_NAME};
pub use progress::{NoopProgress, Stage, StageProgress};
pub use render::{OfficeRenderer, DEFAULT_OFFICE_PROGRAM};
pub use traits::{DocumentExporter, DocumentRenderer};
pub use wordcount::{count_word_frequency, count_word_frequency_in_pdf, WordCounter};
