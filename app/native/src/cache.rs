//! Cache directory for rendered wallpapers.
//!
//! Rendered desktop images live under the user cache directory
//! (`~/.cache/wallcycle` on Linux), falling back to the system temp dir.

use std::path::PathBuf;

use crate::constants::{APP_NAME, OUTPUT_FILE_NAME};

/// Returns the root cache directory for the application.
#[must_use]
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(|| std::env::temp_dir().join(APP_NAME), |cache| cache.join(APP_NAME))
}

/// Default location of the rendered desktop image.
#[must_use]
pub fn default_output_path() -> PathBuf { get_cache_dir().join(OUTPUT_FILE_NAME) }
