use crate::models::{InputFile, PDF_EXTENSION, WORD_PROCESSOR_EXTENSIONS};
use crate::PipelineError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the top-level files of `folder` that the pipeline accepts.
///
/// Files are grouped by extension (`docx`, then `doc`, then `pdf`) and sorted
/// by path inside each group. Symlinked files are included; subdirectories
/// are not visited.
pub fn discover_input_files(folder: &Path) -> Vec<InputFile> {
    let mut entries: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|item| item.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    entries.sort_unstable();

    let mut files = Vec::new();
    for extension in WORD_PROCESSOR_EXTENSIONS.iter().chain([PDF_EXTENSION].iter()) {
        for path in &entries {
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));

            if matches {
                files.push(InputFile::new(path.clone()));
            }
        }
    }

    files
}

pub fn digest_file(path: &Path) -> Result<String, PipelineError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
