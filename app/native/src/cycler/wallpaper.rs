//! Wallpaper records handled by the cycler.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conditions::CycleConditions;

/// How a wallpaper is fitted into the area it covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Scale to cover the area, cropping overflow.
    #[default]
    Fill,
    /// Scale to fit inside the area, letterboxing the rest.
    Fit,
    /// Scale to the exact area, ignoring aspect ratio.
    Stretch,
    /// Keep the original size, centered.
    Center,
}

/// A candidate image and the settings that govern when and where it is shown.
///
/// Equality is identity: two records are the same wallpaper when their `id`
/// matches, regardless of any other field. Clones keep the id, so a deep copy
/// handed to the build step is still recognised by the cycle history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallpaper {
    pub id: Uuid,
    pub path: PathBuf,
    /// Selection weight. `0` means the wallpaper is never picked.
    pub priority: u8,
    pub is_activated: bool,
    /// Spans every screen as one image instead of filling a single screen.
    pub is_multiscreen: bool,
    /// Screen indices this wallpaper must never be placed on.
    pub disabled_screens: BTreeSet<usize>,
    pub placement: Placement,
    pub cycle_conditions: CycleConditions,
}

impl Wallpaper {
    /// Default priority for wallpapers without an explicit one.
    pub const DEFAULT_PRIORITY: u8 = 100;

    /// Creates an activated singlescreen wallpaper with default settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::now_v7(),
            path: path.into(),
            priority: Self::DEFAULT_PRIORITY,
            is_activated: true,
            is_multiscreen: false,
            disabled_screens: BTreeSet::new(),
            placement: Placement::default(),
            cycle_conditions: CycleConditions::default(),
        }
    }

    /// The blank wallpaper composed when every screen shows its static image.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            id: Uuid::nil(),
            path: PathBuf::new(),
            priority: 0,
            is_activated: false,
            ..Self::new(PathBuf::new())
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn with_activated(mut self, is_activated: bool) -> Self {
        self.is_activated = is_activated;
        self
    }

    #[must_use]
    pub const fn with_multiscreen(mut self, is_multiscreen: bool) -> Self {
        self.is_multiscreen = is_multiscreen;
        self
    }

    #[must_use]
    pub fn with_disabled_screens(mut self, screens: impl IntoIterator<Item = usize>) -> Self {
        self.disabled_screens = screens.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: CycleConditions) -> Self {
        self.cycle_conditions = conditions;
        self
    }

    /// Returns whether this is the blank placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool { self.id.is_nil() }

    /// Returns whether the selector may consider this wallpaper at all.
    #[must_use]
    pub const fn is_usable(&self) -> bool { self.is_activated && self.priority > 0 }

    /// Returns whether the wallpaper may be placed on `screen`.
    #[must_use]
    pub fn allows_screen(&self, screen: usize) -> bool { !self.disabled_screens.contains(&screen) }

    /// Evaluates the cycle conditions right now.
    #[must_use]
    pub fn conditions_hold(&self) -> bool { self.cycle_conditions.evaluate() }

    #[must_use]
    pub fn path(&self) -> &Path { &self.path }
}

impl Default for Wallpaper {
    fn default() -> Self { Self::placeholder() }
}

impl PartialEq for Wallpaper {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for Wallpaper {}

impl std::hash::Hash for Wallpaper {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) { self.id.hash(state); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wallpaper_is_usable_singlescreen() {
        let wp = Wallpaper::new("/tmp/a.jpg");
        assert!(wp.is_usable());
        assert!(!wp.is_multiscreen);
        assert_eq!(wp.priority, Wallpaper::DEFAULT_PRIORITY);
        assert!(wp.allows_screen(0));
    }

    #[test]
    fn test_priority_zero_is_not_usable() {
        assert!(!Wallpaper::new("a.jpg").with_priority(0).is_usable());
        assert!(!Wallpaper::new("a.jpg").with_activated(false).is_usable());
    }

    #[test]
    fn test_equality_is_identity() {
        let a = Wallpaper::new("same.jpg");
        let b = Wallpaper::new("same.jpg");
        assert_ne!(a, b);

        let copy = a.clone().with_priority(3);
        assert_eq!(a, copy);
    }

    #[test]
    fn test_disabled_screens() {
        let wp = Wallpaper::new("a.jpg").with_disabled_screens([1, 2]);
        assert!(wp.allows_screen(0));
        assert!(!wp.allows_screen(1));
        assert!(!wp.allows_screen(2));
    }

    #[test]
    fn test_placeholder() {
        let placeholder = Wallpaper::placeholder();
        assert!(placeholder.is_placeholder());
        assert!(!placeholder.is_usable());
        assert!(!Wallpaper::new("a.jpg").is_placeholder());
    }
}
