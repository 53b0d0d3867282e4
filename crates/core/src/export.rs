use crate::error::PipelineError;
use crate::extractor::{LopdfExtractor, PageText, PdfExtractor};
use crate::models::DOCUMENT_EXTENSION;
use crate::render::{describe_failure, OfficeRenderer};
use crate::traits::DocumentExporter;
use docx_rs::{BreakType, Docx, Paragraph, Run};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Rebuilds a `.docx` from the PDF's text layer: one paragraph per text line
/// and a page break between source pages.
#[derive(Default)]
pub struct DocxExporter<E = LopdfExtractor> {
    extractor: E,
}

pub fn build_docx(pages: &[PageText]) -> Docx {
    let mut docx = Docx::new();

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }

        let mut blank_run = false;
        for line in page.text.lines().map(str::trim_end) {
            if line.trim().is_empty() {
                // Collapse runs of blank lines into a single empty paragraph.
                if !blank_run {
                    docx = docx.add_paragraph(Paragraph::new());
                }
                blank_run = true;
                continue;
            }

            blank_run = false;
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(xml_safe_text(line))));
        }
    }

    docx
}

/// Drops characters XML 1.0 cannot carry. Vertical tab and form feed become
/// spaces so the words around them stay apart.
fn xml_safe_text(line: &str) -> String {
    line.chars()
        .filter_map(|c| match c {
            '\u{b}' | '\u{c}' => Some(' '),
            '\t' | '\n' | '\r' => Some(c),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => None,
            _ => Some(c),
        })
        .collect()
}

fn ensure_parent(output: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

impl<E: PdfExtractor> DocumentExporter for DocxExporter<E> {
    fn export(&self, pdf: &Path, output: &Path) -> Result<(), PipelineError> {
        let pages = self.extractor.extract_pages(pdf)?;
        debug!(pdf = %pdf.display(), pages = pages.len(), "building docx");

        ensure_parent(output)?;
        let file = fs::File::create(output)?;
        build_docx(&pages)
            .build()
            .pack(file)
            .map_err(|error| PipelineError::Export(format!("{}: {error}", output.display())))?;

        info!(output = %output.display(), pages = pages.len(), "docx written");
        Ok(())
    }
}

/// Lets the office suite import the PDF into its word processor and save it
/// as `.docx`.
#[derive(Debug, Clone, Default)]
pub struct OfficeExporter {
    office: OfficeRenderer,
}

impl OfficeExporter {
    pub fn new(office: OfficeRenderer) -> Self {
        Self { office }
    }
}

impl DocumentExporter for OfficeExporter {
    fn export(&self, pdf: &Path, output: &Path) -> Result<(), PipelineError> {
        let staging = tempfile::tempdir().map_err(|error| PipelineError::Workspace(error.to_string()))?;

        let result = self
            .office
            .run(&[
                OsStr::new("--infilter=writer_pdf_import"),
                OsStr::new("--convert-to"),
                OsStr::new(DOCUMENT_EXTENSION),
                OsStr::new("--outdir"),
                staging.path().as_os_str(),
                pdf.as_os_str(),
            ])
            .map_err(PipelineError::Export)?;

        if !result.status.success() {
            return Err(PipelineError::Export(describe_failure(&result)));
        }

        let stem = pdf
            .file_stem()
            .ok_or_else(|| PipelineError::Export(format!("{} has no file name", pdf.display())))?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(DOCUMENT_EXTENSION);
        let produced = staging.path().join(name);
        if !produced.is_file() {
            return Err(PipelineError::Export(format!(
                "office program did not write {}",
                produced.display()
            )));
        }

        ensure_parent(output)?;
        fs::copy(&produced, output)?;
        info!(output = %output.display(), "docx written by office program");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_text_pdf;
    use tempfile::tempdir;

    #[test]
    fn docx_is_written_as_a_zip_package() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let pdf = dir.path().join("merged.pdf");
        write_text_pdf(&pdf, &["first page", "second page"])?;

        let output = dir.path().join("out").join("final.docx");
        DocxExporter::<LopdfExtractor>::default().export(&pdf, &output)?;

        let bytes = fs::read(&output)?;
        assert!(bytes.starts_with(b"PK"));
        Ok(())
    }

    #[test]
    fn exported_text_survives_reading_back() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let pdf = dir.path().join("merged.pdf");
        write_text_pdf(&pdf, &["quarterly figures"])?;

        let output = dir.path().join("final.docx");
        DocxExporter::<LopdfExtractor>::default().export(&pdf, &output)?;

        let docx = docx_rs::read_docx(&fs::read(&output)?)?;
        let json = docx.json();
        assert!(json.contains("quarterly figures"));
        Ok(())
    }

    #[test]
    fn unreadable_pdf_is_not_exported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let pdf = dir.path().join("broken.pdf");
        fs::write(&pdf, b"%PDF-1.4\n%broken")?;

        let output = dir.path().join("final.docx");
        assert!(DocxExporter::<LopdfExtractor>::default().export(&pdf, &output).is_err());
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn control_characters_never_reach_document_xml() -> Result<(), Box<dyn std::error::Error>> {
        let pages = vec![PageText {
            number: 1,
            text: "form\u{c}feed and \u{1}soh\u{0}\tend".to_string(),
        }];

        let xml = String::from_utf8(build_docx(&pages).build().document)?;

        assert!(xml.contains("form feed and soh\tend"), "{xml}");
        assert!(!xml.chars().any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r')));
        Ok(())
    }

    #[test]
    fn missing_office_program_fails_the_export() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let pdf = dir.path().join("merged.pdf");
        write_text_pdf(&pdf, &["page"])?;

        let exporter = OfficeExporter::new(OfficeRenderer::new(dir.path().join("no-such-soffice")));
        let output = dir.path().join("final.docx");
        let error = exporter.export(&pdf, &output).expect_err("program does not exist");

        assert!(matches!(error, PipelineError::Export(_)));
        assert_eq!(error.kind(), crate::ErrorKind::Pipeline);
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn pages_are_separated_by_breaks() {
        let pages = vec![
            PageText {
                number: 1,
                text: "a\n\n\nb".to_string(),
            },
            PageText {
                number: 2,
                text: "c".to_string(),
            },
        ];

        let docx = build_docx(&pages);
        // a, one collapsed blank, b, page break, c
        assert_eq!(docx.document.children.len(), 5);
    }
}
