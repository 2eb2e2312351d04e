//! Product directory scanning for building the image catalog.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    let exts: &[&str] = &[
        "avif", "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff",
    ];
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| *e == ext)
        })
}

/// Scan `product_dir` (resolved against `asset_root`) for image references.
///
/// References come back relative to `asset_root` and sorted, so the catalog
/// order is stable across sessions.
///
/// # Errors
/// Returns [`Error::BadDir`] if the directory is missing or not a directory.
pub fn scan_references(asset_root: &Path, product_dir: &Path) -> Result<Vec<String>, Error> {
    let root = if product_dir.is_absolute() {
        product_dir.to_path_buf()
    } else {
        asset_root.join(product_dir)
    };
    if !root.exists() || !root.is_dir() {
        return Err(Error::BadDir(root.to_string_lossy().into_owned()));
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(&root)
        .into_iter()
        // Skip hidden dot-directories *below* the root only.
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
    {
        let path = entry.path();
        if path.is_file() && is_supported_image(path) {
            let reference = path
                .strip_prefix(asset_root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();
            out.push(reference);
        }
    }
    out.sort();
    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 {
        return false;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
