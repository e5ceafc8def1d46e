//! Inputs the cycler pulls from its environment.

use parking_lot::RwLock;

use super::screens::ScreenBounds;
use super::wallpaper::Wallpaper;

/// Supplies the candidate pool when a cycle is triggered without one.
///
/// Implementations must not call back into the cycler.
pub trait WallpaperProvider: Send + Sync {
    /// Returns the current candidate pool. An empty pool fails the cycle.
    fn request_wallpapers(&self) -> Vec<Wallpaper>;
}

impl<F> WallpaperProvider for F
where
    F: Fn() -> Vec<Wallpaper> + Send + Sync,
{
    fn request_wallpapers(&self) -> Vec<Wallpaper> { self() }
}

/// Reports the current screen geometry.
pub trait ScreenTopology: Send + Sync {
    /// Bounds of every connected screen, in screen index order.
    fn screens(&self) -> Vec<ScreenBounds>;
}

/// A topology whose geometry is set by the owner, e.g. from configuration.
#[derive(Debug, Default)]
pub struct FixedTopology {
    screens: RwLock<Vec<ScreenBounds>>,
}

impl FixedTopology {
    #[must_use]
    pub fn new(screens: Vec<ScreenBounds>) -> Self { Self { screens: RwLock::new(screens) } }

    /// Replaces the geometry. Call the cycler's display-change handler afterwards.
    pub fn set_screens(&self, screens: Vec<ScreenBounds>) { *self.screens.write() = screens; }
}

impl ScreenTopology for FixedTopology {
    fn screens(&self) -> Vec<ScreenBounds> { self.screens.read().clone() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_provider() {
        let provider = || vec![Wallpaper::new("a.jpg")];
        assert_eq!(provider.request_wallpapers().len(), 1);
    }

    #[test]
    fn test_fixed_topology_updates() {
        let topology = FixedTopology::new(vec![ScreenBounds::new(0, 0, 800, 600)]);
        assert_eq!(topology.screens().len(), 1);

        topology.set_screens(vec![ScreenBounds::default(); 3]);
        assert_eq!(topology.screens().len(), 3);
    }
}
