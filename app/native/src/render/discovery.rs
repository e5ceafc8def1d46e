//! Wallpaper discovery in configured directories.

use std::fs;
use std::path::{Path, PathBuf};

use natord::compare;

use crate::constants::IMAGE_EXTENSIONS;
use crate::platform::path::expand;

/// Returns whether `path` has a supported image extension (case-insensitive).
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Lists the images directly inside `dir`, in natural order.
///
/// `dir` may start with `~`. A missing or unreadable directory yields an
/// empty list; subdirectories are not scanned.
#[must_use]
pub fn discover_images(dir: &str) -> Vec<PathBuf> {
    let dir = expand(dir);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "cannot scan wallpaper directory");
            return Vec::new();
        }
    };

    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    images.sort_by(|a, b| compare(&a.to_string_lossy(), &b.to_string_lossy()));
    images
}
