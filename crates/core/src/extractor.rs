use crate::error::PipelineError;
use lopdf::Document;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, PipelineError>;
}

/// Extracts text page by page with `lopdf`.
///
/// Every page of the document is returned, in page order. A page whose
/// content cannot be decoded yields empty text instead of failing the whole
/// document.
#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, PipelineError> {
        let document = Document::load(path).map_err(|error| {
            PipelineError::PdfParse(format!("{}: {error}", path.display()))
        })?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = match document.extract_text(&[page_no]) {
                Ok(text) => text,
                Err(error) => {
                    warn!(path = %path.display(), page = page_no, %error, "page text unreadable");
                    String::new()
                }
            };

            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        Ok(pages)
    }
}

pub fn extract_page_texts(path: &Path) -> Result<Vec<PageText>, PipelineError> {
    LopdfExtractor.extract_pages(path)
}

#[cfg(test)]
mod tests {
    use super::extract_page_texts;
    use crate::fixtures::write_text_pdf;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn pages_come_back_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("three.pdf");
        write_text_pdf(&path, &["alpha page", "beta page", "gamma page"])?;

        let pages = extract_page_texts(&path)?;

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("alpha"));
        assert!(pages[1].text.contains("beta"));
        assert!(pages[2].text.contains("gamma"));
        Ok(())
    }

    #[test]
    fn garbage_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        assert!(extract_page_texts(&path).is_err());
        Ok(())
    }
}
