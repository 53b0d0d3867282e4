use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const WORD_PROCESSOR_EXTENSIONS: [&str; 2] = ["docx", "doc"];
pub const PDF_EXTENSION: &str = "pdf";
pub const DOCUMENT_EXTENSION: &str = "docx";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    WordProcessor,
    Pdf,
    Unsupported,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return DocumentKind::Unsupported;
        };

        if WORD_PROCESSOR_EXTENSIONS
            .iter()
            .any(|candidate| extension.eq_ignore_ascii_case(candidate))
        {
            DocumentKind::WordProcessor
        } else if extension.eq_ignore_ascii_case(PDF_EXTENSION) {
            DocumentKind::Pdf
        } else {
            DocumentKind::Unsupported
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

impl InputFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = DocumentKind::from_path(&path);
        Self { path, kind }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PdfOrigin {
    Passthrough,
    Converted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PdfFile {
    pub path: PathBuf,
    pub source: PathBuf,
    pub origin: PdfOrigin,
}

impl PdfFile {
    pub fn passthrough(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source: path.clone(),
            path,
            origin: PdfOrigin::Passthrough,
        }
    }

    pub fn converted(path: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            origin: PdfOrigin::Converted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedDocument {
    pub path: PathBuf,
    pub page_count: usize,
}

/// A trimmed, lowercased, non-empty word to look for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SearchWord(String);

impl SearchWord {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordTally {
    pub word: SearchWord,
    pub count: usize,
}

/// One tally per supplied word, in the order the words were supplied.
/// Repeated words keep separate tallies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct WordCounts {
    pub tallies: Vec<WordTally>,
}

impl WordCounts {
    pub fn zeroed(words: &[SearchWord]) -> Self {
        Self {
            tallies: words
                .iter()
                .map(|word| WordTally {
                    word: word.clone(),
                    count: 0,
                })
                .collect(),
        }
    }

    pub fn get(&self, word: &str) -> Option<usize> {
        self.tallies
            .iter()
            .find(|tally| tally.word.as_str() == word)
            .map(|tally| tally.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordTally> {
        self.tallies.iter()
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub pdfs: Vec<PdfFile>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<SkippedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub source_dir: PathBuf,
    pub inputs: Vec<InputFile>,
    pub normalization: NormalizationReport,
    pub merged_page_count: usize,
    pub output_path: PathBuf,
    pub word_counts: Option<WordCounts>,
}

impl PipelineReport {
    pub fn write_json(&self, path: &Path) -> Result<(), crate::PipelineError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
