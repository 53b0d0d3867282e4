use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("the provided path is not a valid directory: {0}")]
    InvalidSource(PathBuf),

    #[error("no DOC, DOCX, or PDF files found in {0}")]
    NoInputFiles(PathBuf),

    #[error("failed to convert {path} to pdf: {reason}")]
    Conversion { path: PathBuf, reason: String },

    #[error("no input file could be normalized to pdf")]
    NothingToMerge,

    #[error("pdf merge failed: {0}")]
    Merge(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("document export failed: {0}")]
    Export(String),

    #[error("temporary workspace error: {0}")]
    Workspace(String),

    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),

    #[error("output document was not created at {0}")]
    OutputMissing(PathBuf),

    #[error("audit log already flushed to {0}")]
    AuditAlreadyFlushed(PathBuf),
}

/// Coarse failure classes callers can branch on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source directory is missing or not a directory. Nothing ran.
    InvalidSource,
    /// A single input could not be converted to PDF.
    FileConversion,
    /// The run stopped early: no inputs, merge, export, extraction or I/O.
    Pipeline,
    /// The run finished but the output document does not exist.
    OutputWrite,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidSource(_) => ErrorKind::InvalidSource,
            PipelineError::Conversion { .. } => ErrorKind::FileConversion,
            PipelineError::OutputMissing(_) => ErrorKind::OutputWrite,
            _ => ErrorKind::Pipeline,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{ErrorKind, PipelineError};
    use std::path::PathBuf;

    #[test]
    fn every_variant_maps_to_one_of_four_kinds() {
        let cases = [
            (PipelineError::InvalidSource(PathBuf::from("x")), ErrorKind::InvalidSource),
            (
                PipelineError::Conversion {
                    path: PathBuf::from("a.docx"),
                    reason: "exit status 1".to_string(),
                },
                ErrorKind::FileConversion,
            ),
            (PipelineError::Merge("corrupt".to_string()), ErrorKind::Pipeline),
            (PipelineError::Export("boom".to_string()), ErrorKind::Pipeline),
            (PipelineError::NothingToMerge, ErrorKind::Pipeline),
            (PipelineError::NoInputFiles(PathBuf::from("d")), ErrorKind::Pipeline),
            (PipelineError::OutputMissing(PathBuf::from("o.docx")), ErrorKind::OutputWrite),
        ];

        for (error, expected) in cases {
            assert_eq!(error.kind(), expected, "{error}");
        }
    }
}
