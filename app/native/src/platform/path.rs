//! Shell-like expansion of configured paths.
//!
//! Wallpaper paths, directories and the output path in the config file may
//! start with `~`. Relative paths are resolved against the config file's
//! directory so a config can ship next to its images.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the home directory. Blank input yields an empty path.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return PathBuf::new();
    }
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Expands `path` and joins it onto `base_dir` unless it is already absolute.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);
    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }
    base_dir.join(expanded)
}
