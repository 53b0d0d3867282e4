//! Page-sequence concatenation of whole PDFs with `lopdf`.
//!
//! Every source is renumbered into a disjoint object-id range, its page
//! objects are collected in page order, and a single page tree is rebuilt
//! over all of them. Outlines are dropped.

use crate::error::PipelineError;
use crate::models::{MergedDocument, PdfFile};
use crate::progress::{NoopProgress, Stage, StageProgress};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

pub fn merge_pdfs(
    pdfs: &[PdfFile],
    output: &Path,
    progress: &dyn StageProgress,
) -> Result<MergedDocument, PipelineError> {
    let paths: Vec<&Path> = pdfs.iter().map(|pdf| pdf.path.as_path()).collect();
    merge_paths(&paths, output, progress)
}

pub fn merge_pdf_paths(paths: &[&Path], output: &Path) -> Result<MergedDocument, PipelineError> {
    merge_paths(paths, output, &NoopProgress)
}

fn merge_paths(
    paths: &[&Path],
    output: &Path,
    progress: &dyn StageProgress,
) -> Result<MergedDocument, PipelineError> {
    if paths.is_empty() {
        return Err(PipelineError::Merge("no pdf files to merge".to_string()));
    }

    info!(inputs = paths.len(), output = %output.display(), "merging pdfs");

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    progress.on_stage_start(Stage::Merging, paths.len());
    for path in paths {
        let mut document = Document::load(path)
            .map_err(|error| PipelineError::Merge(format!("failed to load {}: {error}", path.display())))?;

        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        let before = pages.len();
        for (_page_no, page_id) in document.get_pages() {
            let page = flattened_page(&document, page_id).map_err(|error| {
                PipelineError::Merge(format!("{}: {error}", path.display()))
            })?;
            pages.push((page_id, page));
        }
        debug!(path = %path.display(), pages = pages.len() - before, "collected pages");

        objects.extend(document.objects);
        progress.on_item_done(Stage::Merging);
    }
    progress.on_stage_finish(Stage::Merging);

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut page_tree: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in objects {
        match dictionary_type(&object) {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    if let Ok(dictionary) = object.as_dict() {
                        catalog = Some((object_id, dictionary.clone()));
                    }
                }
            }
            Some(b"Pages") => {
                if page_tree.is_none() {
                    if let Ok(dictionary) = object.as_dict() {
                        page_tree = Some((object_id, dictionary.clone()));
                    }
                }
            }
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (catalog_id, mut catalog) =
        catalog.ok_or_else(|| PipelineError::Merge("no document catalog found".to_string()))?;
    let (pages_id, mut page_tree) =
        page_tree.ok_or_else(|| PipelineError::Merge("no page tree found".to_string()))?;

    let page_count = pages.len();
    let mut kids = Vec::with_capacity(page_count);
    for (page_id, mut page) in pages {
        page.set("Parent", pages_id);
        merged.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    for key in INHERITABLE_PAGE_KEYS {
        page_tree.remove(key);
    }
    page_tree.remove(b"Parent");
    page_tree.set("Count", page_count as i64);
    page_tree.set("Kids", kids);
    merged.objects.insert(pages_id, Object::Dictionary(page_tree));

    catalog.set("Pages", pages_id);
    catalog.remove(b"Outlines");
    catalog.remove(b"PageMode");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
    merged.renumber_objects();
    merged.compress();

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    merged
        .save(output)
        .map_err(|error| PipelineError::Merge(format!("failed to write {}: {error}", output.display())))?;

    info!(pages = page_count, output = %output.display(), "merge complete");
    Ok(MergedDocument {
        path: output.to_path_buf(),
        page_count,
    })
}

fn dictionary_type(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|dictionary| dictionary.get(b"Type").ok())
        .and_then(|value| value.as_name().ok())
}

/// Copies the page dictionary and fills in attributes it inherits from
/// intermediate page-tree nodes, which the rebuilt tree no longer has.
fn flattened_page(document: &Document, page_id: ObjectId) -> Result<Dictionary, String> {
    let mut page = document
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|error| format!("page {page_id:?} unreadable: {error}"))?
        .clone();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        // Guard against cyclic Parent chains in malformed files.
        depth += 1;
        if depth > 64 {
            break;
        }

        let Ok(node) = document.get_object(node_id).and_then(Object::as_dict) else {
            break;
        };

        for key in INHERITABLE_PAGE_KEYS {
            if page.get(key).is_err() {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }

        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(page)
}

pub fn page_count(path: &Path) -> Result<usize, PipelineError> {
    let document = Document::load(path)
        .map_err(|error| PipelineError::PdfParse(format!("{}: {error}", path.display())))?;
    Ok(document.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_page_texts;
    use crate::fixtures::write_text_pdf;
    use crate::ErrorKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn page_count_is_the_sum_and_order_is_kept() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        let third = dir.path().join("third.pdf");
        write_text_pdf(&first, &["one", "two"])?;
        write_text_pdf(&second, &["three"])?;
        write_text_pdf(&third, &["four", "five", "six"])?;

        let output = dir.path().join("merged.pdf");
        let merged = merge_pdf_paths(&[first.as_path(), second.as_path(), third.as_path()], &output)?;

        assert_eq!(merged.page_count, 6);
        assert_eq!(page_count(&output)?, 6);

        let pages = extract_page_texts(&output)?;
        let expected = ["one", "two", "three", "four", "five", "six"];
        for (page, word) in pages.iter().zip(expected) {
            assert!(page.text.contains(word), "page {} should contain {word}: {:?}", page.number, page.text);
        }
        Ok(())
    }

    #[test]
    fn reversed_inputs_reverse_the_pages() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        write_text_pdf(&a, &["apple"])?;
        write_text_pdf(&b, &["banana"])?;

        let output = dir.path().join("ba.pdf");
        merge_pdf_paths(&[b.as_path(), a.as_path()], &output)?;

        let pages = extract_page_texts(&output)?;
        assert!(pages[0].text.contains("banana"));
        assert!(pages[1].text.contains("apple"));
        Ok(())
    }

    #[test]
    fn corrupt_input_fails_the_merge() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let good = dir.path().join("good.pdf");
        let bad = dir.path().join("bad.pdf");
        write_text_pdf(&good, &["fine"])?;
        fs::write(&bad, b"%PDF-1.4\n%broken")?;

        let output = dir.path().join("merged.pdf");
        let error = merge_pdf_paths(&[good.as_path(), bad.as_path()], &output).expect_err("corrupt pdf must fail");

        assert!(matches!(error, PipelineError::Merge(_)));
        assert_eq!(error.kind(), ErrorKind::Pipeline);
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn empty_input_is_rejected() {
        let result = merge_pdfs(&[], Path::new("unused.pdf"), &NoopProgress);
        assert!(matches!(result, Err(PipelineError::Merge(_))));
    }
}
