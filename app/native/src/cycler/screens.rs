//! Per-screen cycling settings.

use serde::Serialize;

use super::wallpaper::Wallpaper;

/// Position and size of a screen on the virtual desktop, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScreenBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenBounds {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self { Self { x, y, width, height } }

    /// Smallest rectangle enclosing every screen.
    #[must_use]
    pub fn union(screens: &[Self]) -> Option<Self> {
        let first = screens.first()?;
        let mut left = i64::from(first.x);
        let mut top = i64::from(first.y);
        let mut right = left + i64::from(first.width);
        let mut bottom = top + i64::from(first.height);

        for screen in &screens[1..] {
            left = left.min(i64::from(screen.x));
            top = top.min(i64::from(screen.y));
            right = right.max(i64::from(screen.x) + i64::from(screen.width));
            bottom = bottom.max(i64::from(screen.y) + i64::from(screen.height));
        }

        Some(Self {
            x: i32::try_from(left).ok()?,
            y: i32::try_from(top).ok()?,
            width: u32::try_from(right - left).ok()?,
            height: u32::try_from(bottom - top).ok()?,
        })
    }
}

/// Cycling settings of one screen.
#[derive(Debug, Clone)]
pub struct ScreenSettings {
    /// Pick a fresh wallpaper for this screen on every cycle.
    pub cycle_randomly: bool,
    /// Shown while the screen is not cycling and the wallpaper's conditions hold.
    pub static_wallpaper: Wallpaper,
    pub bounds: ScreenBounds,
}

impl ScreenSettings {
    /// A screen that cycles randomly.
    #[must_use]
    pub fn random(bounds: ScreenBounds) -> Self {
        Self {
            cycle_randomly: true,
            static_wallpaper: Wallpaper::placeholder(),
            bounds,
        }
    }

    /// A screen that keeps showing `wallpaper`.
    #[must_use]
    pub const fn fixed(wallpaper: Wallpaper, bounds: ScreenBounds) -> Self {
        Self { cycle_randomly: false, static_wallpaper: wallpaper, bounds }
    }

    /// Returns whether this screen needs a freshly picked wallpaper this cycle.
    ///
    /// A static screen falls back to random cycling while its static
    /// wallpaper's conditions do not hold.
    #[must_use]
    pub fn requires_random(&self) -> bool {
        self.cycle_randomly || !self.static_wallpaper.conditions_hold()
    }
}

/// Ordered settings of every screen, indexed `0..N`.
#[derive(Debug, Clone, Default)]
pub struct ScreensSettings {
    screens: Vec<ScreenSettings>,
}

impl ScreensSettings {
    #[must_use]
    pub const fn new(screens: Vec<ScreenSettings>) -> Self { Self { screens } }

    /// Settings with every screen cycling randomly.
    #[must_use]
    pub fn all_random(bounds: &[ScreenBounds]) -> Self {
        Self::new(bounds.iter().copied().map(ScreenSettings::random).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize { self.screens.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.screens.is_empty() }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScreenSettings> { self.screens.get(index) }

    pub fn iter(&self) -> std::slice::Iter<'_, ScreenSettings> { self.screens.iter() }

    /// Returns whether every screen shows its static wallpaper this cycle.
    #[must_use]
    pub fn all_static(&self) -> bool { self.screens.iter().all(|s| !s.requires_random()) }

    /// Number of screens that need a freshly picked wallpaper this cycle.
    #[must_use]
    pub fn random_cycled_count(&self) -> usize {
        self.screens.iter().filter(|s| s.requires_random()).count()
    }

    /// Returns whether the desktop spans more than one screen.
    #[must_use]
    pub fn is_multiscreen(&self) -> bool { self.screens.len() > 1 }

    /// Bounds of every screen, in order.
    #[must_use]
    pub fn bounds(&self) -> Vec<ScreenBounds> { self.screens.iter().map(|s| s.bounds).collect() }

    /// Syncs the collection with the current screen geometry.
    ///
    /// Existing screens keep their settings and take the new bounds, extra
    /// screens are appended as randomly cycling, missing ones are dropped.
    /// Returns whether the screen count changed.
    pub fn refresh_bounds(&mut self, bounds: &[ScreenBounds]) -> bool {
        let previous = self.screens.len();
        self.screens.truncate(bounds.len());

        for (settings, bound) in self.screens.iter_mut().zip(bounds) {
            settings.bounds = *bound;
        }

        for bound in bounds.iter().skip(previous) {
            self.screens.push(ScreenSettings::random(*bound));
        }

        previous != self.screens.len()
    }
}

impl<'a> IntoIterator for &'a ScreensSettings {
    type Item = &'a ScreenSettings;
    type IntoIter = std::slice::Iter<'a, ScreenSettings>;

    fn into_iter(self) -> Self::IntoIter { self.screens.iter() }
}
