//! Desktop background integration through the `wallpaper` crate.

use std::fs;
use std::path::Path;

use image::{ImageFormat, RgbaImage};

use crate::cycler::build::{Arrangement, DesktopApplier};
use crate::cycler::error::BuildError;

/// Writes PNGs to disk and hands them to the OS desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDesktop;

impl SystemDesktop {
    #[must_use]
    pub const fn new() -> Self { Self }
}

const fn mode_for(arrangement: Arrangement) -> wallpaper::Mode {
    match arrangement {
        Arrangement::Span => wallpaper::Mode::Span,
        Arrangement::Tile => wallpaper::Mode::Tile,
        Arrangement::Stretch => wallpaper::Mode::Stretch,
        Arrangement::Center => wallpaper::Mode::Center,
    }
}

impl DesktopApplier for SystemDesktop {
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), BuildError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        image.save_with_format(path, ImageFormat::Png)?;
        tracing::debug!(path = %path.display(), "saved desktop image");
        Ok(())
    }

    fn apply(&self, path: &Path, arrangement: Arrangement) -> Result<(), BuildError> {
        if !path.exists() {
            return Err(BuildError::Apply(format!("{} does not exist", path.display())));
        }

        let path_str = path.to_string_lossy();
        wallpaper::set_from_path(&path_str).map_err(|err| BuildError::Apply(err.to_string()))?;

        // Not every desktop supports arrangement modes; the image is already set.
        if let Err(err) = wallpaper::set_mode(mode_for(arrangement)) {
            tracing::debug!(?arrangement, error = %err, "desktop rejected arrangement mode");
        }
        Ok(())
    }
}
