//! Deterministic file discovery
//!
//! Fallback resolution depends on the order declaration files are read, so the
//! walk order is part of the contract: entries of a directory are visited in
//! file-name byte order, and every subdirectory is fully descended before its
//! next sibling (lexicographic depth-first). Output never depends on the order
//! the operating system happens to return directory entries in.

use crate::error::{ConverterError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All regular files under `root` whose name ends with `suffix`, in walk order
pub fn list_files(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ConverterError::file_not_found(
            root.display().to_string(),
            "not a directory",
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ConverterError::traversal(root.display().to_string(), e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.ends_with(suffix));
        if matches {
            files.push(entry.into_path());
        }
    }

    log::debug!("Found {} '{}' files under {}", files.len(), suffix, root.display());
    Ok(files)
}

/// `path` relative to `root` with `/` separators, regardless of platform
pub fn relative_slash_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        ConverterError::traversal(
            root.display().to_string(),
            format!("{} is outside the walked tree", path.display()),
        )
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
