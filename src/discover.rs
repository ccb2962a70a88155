//! Input discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Extension of OneNote section files.
pub const SECTION_EXTENSION: &str = "one";

/// Table-of-contents files share the `.one` prefix but hold no pages.
const TOC_MARKER: &str = ".onetoc2";

/// Recursively find section files under `root`, in sorted path order.
///
/// `extension` is matched case-insensitively against the end of the file
/// name, so compound extensions such as `one.json` work. Notebook table of
/// contents files (`.onetoc2`) are always skipped.
pub fn discover_sections(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::at(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "input directory not found"),
        ));
    }

    let suffix = format!(".{}", extension.trim_start_matches('.').to_lowercase());
    let mut found = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::at(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains(TOC_MARKER) || !name.ends_with(&suffix) || name.len() == suffix.len() {
            continue;
        }
        found.push(entry.into_path());
    }

    found.sort();
    log::debug!("Found {} section file(s) under {}", found.len(), root.display());
    Ok(found)
}
