//! Image composition.
//!
//! The canvas covers the bounding box of every screen on the virtual desktop.
//! Each screen's area is filled according to the wallpaper's [`Placement`];
//! a spanning wallpaper covers the whole box. Areas left without an image
//! (the placeholder, or nothing placed) stay black.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageError, ImageReader, Rgba, RgbaImage};

use crate::cycler::build::Composer;
use crate::cycler::error::BuildError;
use crate::cycler::layout::{Composition, CompositionPlan};
use crate::cycler::screens::ScreenBounds;
use crate::cycler::wallpaper::{Placement, Wallpaper};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Composer backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageComposer {
    filter: Option<FilterType>,
}

impl ImageComposer {
    #[must_use]
    pub const fn new() -> Self { Self { filter: None } }

    /// Uses `filter` instead of Catmull-Rom when resizing.
    #[must_use]
    pub const fn with_filter(filter: FilterType) -> Self { Self { filter: Some(filter) } }

    fn filter(&self) -> FilterType { self.filter.unwrap_or(FilterType::CatmullRom) }

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        wallpaper: &Wallpaper,
        area: Area,
    ) -> Result<(), BuildError> {
        if wallpaper.is_placeholder() || area.width == 0 || area.height == 0 {
            return Ok(());
        }

        let source = load_image(wallpaper.path())?;
        let fitted = fit_to_area(&source, area.width, area.height, wallpaper.placement, self.filter());

        let left = area.x + i64::from(area.width.saturating_sub(fitted.width()) / 2);
        let top = area.y + i64::from(area.height.saturating_sub(fitted.height()) / 2);
        imageops::overlay(canvas, &fitted, left, top);
        Ok(())
    }
}

impl Composer for ImageComposer {
    fn compose(&self, plan: &CompositionPlan, scale_factor: f32) -> Result<RgbaImage, BuildError> {
        let desktop = ScreenBounds::union(&plan.screens).ok_or(BuildError::EmptyPlan)?;
        let mut canvas = RgbaImage::from_pixel(
            scale(desktop.width, scale_factor),
            scale(desktop.height, scale_factor),
            BACKGROUND,
        );

        match &plan.composition {
            Composition::Spanning(wallpaper) => {
                let area = Area::covering(&desktop, &desktop, scale_factor);
                self.draw(&mut canvas, wallpaper, area)?;
            }
            Composition::PerScreen(wallpapers) => {
                for (screen, wallpaper) in plan.screens.iter().zip(wallpapers) {
                    let area = Area::covering(screen, &desktop, scale_factor);
                    self.draw(&mut canvas, wallpaper, area)?;
                }
            }
        }

        tracing::debug!(
            width = canvas.width(),
            height = canvas.height(),
            screens = plan.screens.len(),
            "composed desktop image"
        );
        Ok(canvas)
    }
}

/// Target rectangle on the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Area {
    x: i64,
    y: i64,
    width: u32,
    height: u32,
}

impl Area {
    fn covering(screen: &ScreenBounds, desktop: &ScreenBounds, factor: f32) -> Self {
        Self {
            x: offset(i64::from(screen.x) - i64::from(desktop.x), factor),
            y: offset(i64::from(screen.y) - i64::from(desktop.y), factor),
            width: scale(screen.width, factor),
            height: scale(screen.height, factor),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scale(value: u32, factor: f32) -> u32 { (f64::from(value) * f64::from(factor)).round().max(1.0) as u32 }

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn offset(value: i64, factor: f32) -> i64 { (value as f64 * f64::from(factor)).round() as i64 }

fn load_image(path: &Path) -> Result<DynamicImage, BuildError> {
    let read_error = |source: ImageError| BuildError::ImageRead { path: path.to_path_buf(), source };

    ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|err| read_error(ImageError::IoError(err)))?
        .decode()
        .map_err(read_error)
}

/// Scales `image` for a `width` x `height` area. The result may be smaller
/// than the area (fit, center) but never larger.
fn fit_to_area(
    image: &DynamicImage,
    width: u32,
    height: u32,
    placement: Placement,
    filter: FilterType,
) -> RgbaImage {
    match placement {
        Placement::Fill => image.resize_to_fill(width, height, filter).to_rgba8(),
        Placement::Fit => image.resize(width, height, filter).to_rgba8(),
        Placement::Stretch => image.resize_exact(width, height, filter).to_rgba8(),
        Placement::Center => {
            let (source_width, source_height) = image.dimensions();
            let crop_width = source_width.min(width);
            let crop_height = source_height.min(height);
            image
                .crop_imm(
                    (source_width - crop_width) / 2,
                    (source_height - crop_height) / 2,
                    crop_width,
                    crop_height,
                )
                .to_rgba8()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn solid_png(dir: &TempDir, name: &str, width: u32, height: u32, color: Rgba<u8>) -> PathBuf {
        let path = dir.path().join(name);
        RgbaImage::from_pixel(width, height, color).save(&path).unwrap();
        path
    }

    fn composer() -> ImageComposer { ImageComposer::with_filter(FilterType::Nearest) }

    fn two_screens() -> Vec<ScreenBounds> {
        vec![ScreenBounds::new(0, 0, 4, 2), ScreenBounds::new(4, 0, 4, 2)]
    }

    #[test]
    fn test_per_screen_images_land_on_their_screen() {
        let dir = TempDir::new().unwrap();
        let red = Wallpaper::new(solid_png(&dir, "red.png", 8, 8, RED));
        let blue = Wallpaper::new(solid_png(&dir, "blue.png", 3, 3, BLUE));
        let plan = CompositionPlan {
            screens: two_screens(),
            composition: Composition::PerScreen(vec![red, blue]),
        };

        let canvas = composer().compose(&plan, 1.0).unwrap();

        assert_eq!(canvas.dimensions(), (8, 2));
        assert_eq!(*canvas.get_pixel(0, 0), RED);
        assert_eq!(*canvas.get_pixel(3, 1), RED);
        assert_eq!(*canvas.get_pixel(4, 0), BLUE);
        assert_eq!(*canvas.get_pixel(7, 1), BLUE);
    }

    #[test]
    fn test_placeholder_leaves_screen_black() {
        let dir = TempDir::new().unwrap();
        let red = Wallpaper::new(solid_png(&dir, "red.png", 4, 2, RED));
        let plan = CompositionPlan {
            screens: two_screens(),
            composition: Composition::PerScreen(vec![Wallpaper::placeholder(), red]),
        };

        let canvas = composer().compose(&plan, 1.0).unwrap();

        assert_eq!(*canvas.get_pixel(1, 1), BACKGROUND);
        assert_eq!(*canvas.get_pixel(5, 1), RED);
    }

    #[test]
    fn test_spanning_image_covers_desktop() {
        let dir = TempDir::new().unwrap();
        let wide = Wallpaper::new(solid_png(&dir, "wide.png", 16, 4, BLUE)).with_multiscreen(true);
        let plan = CompositionPlan {
            screens: two_screens(),
            composition: Composition::Spanning(wide),
        };

        let canvas = composer().compose(&plan, 1.0).unwrap();

        assert!(canvas.pixels().all(|pixel| *pixel == BLUE));
    }

    #[test]
    fn test_scale_factor_shrinks_canvas() {
        let plan = CompositionPlan {
            screens: two_screens(),
            composition: Composition::Spanning(Wallpaper::placeholder()),
        };

        let canvas = composer().compose(&plan, 0.5).unwrap();

        assert_eq!(canvas.dimensions(), (4, 1));
    }

    #[test]
    fn test_negative_screen_origin() {
        let dir = TempDir::new().unwrap();
        let red = Wallpaper::new(solid_png(&dir, "red.png", 2, 2, RED));
        let plan = CompositionPlan {
            screens: vec![ScreenBounds::new(-2, 0, 2, 2), ScreenBounds::new(0, 0, 2, 2)],
            composition: Composition::PerScreen(vec![red, Wallpaper::placeholder()]),
        };

        let canvas = composer().compose(&plan, 1.0).unwrap();

        assert_eq!(*canvas.get_pixel(0, 0), RED);
        assert_eq!(*canvas.get_pixel(2, 0), BACKGROUND);
    }

    #[test]
    fn test_fit_letterboxes() {
        let dir = TempDir::new().unwrap();
        let tall = Wallpaper::new(solid_png(&dir, "tall.png", 2, 4, RED)).with_placement(Placement::Fit);
        let plan = CompositionPlan {
            screens: vec![ScreenBounds::new(0, 0, 8, 4)],
            composition: Composition::PerScreen(vec![tall]),
        };

        let canvas = composer().compose(&plan, 1.0).unwrap();

        assert_eq!(*canvas.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*canvas.get_pixel(4, 2), RED);
    }

    #[test]
    fn test_missing_image_reports_path() {
        let plan = CompositionPlan {
            screens: vec![ScreenBounds::new(0, 0, 4, 4)],
            composition: Composition::PerScreen(vec![Wallpaper::new("/nonexistent/wallcycle.png")]),
        };

        let err = composer().compose(&plan, 1.0).unwrap_err();

        assert!(matches!(err, BuildError::ImageRead { ref path, .. } if path.ends_with("wallcycle.png")));
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        let plan = CompositionPlan {
            screens: Vec::new(),
            composition: Composition::PerScreen(Vec::new()),
        };
        assert!(matches!(composer().compose(&plan, 1.0), Err(BuildError::EmptyPlan)));
    }

    #[test]
    fn test_center_crops_large_images() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, RED));
        let fitted = fit_to_area(&image, 4, 6, Placement::Center, FilterType::Nearest);
        assert_eq!(fitted.dimensions(), (4, 6));
    }
}
