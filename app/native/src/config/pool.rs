//! Wallpaper pool built from the configuration.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::types::CyclerConfig;
use crate::cycler::{Wallpaper, WallpaperProvider};
use crate::platform::path::expand_and_resolve;
use crate::render::discover_images;

/// Provides the configured wallpapers plus whatever the configured
/// directories hold at request time.
///
/// Records keep their identity across requests, so the cycle history keeps
/// recognising them after a rescan.
#[derive(Debug)]
pub struct ConfigPool {
    explicit: Vec<Wallpaper>,
    directories: Vec<PathBuf>,
    discovered: Mutex<HashMap<PathBuf, Wallpaper>>,
}

impl ConfigPool {
    /// Resolves the configured paths against `base_dir`.
    #[must_use]
    pub fn new(config: &CyclerConfig, base_dir: &Path) -> Self {
        Self {
            explicit: config.wallpapers.iter().map(|entry| entry.to_wallpaper(base_dir)).collect(),
            directories: config
                .directories
                .iter()
                .map(|dir| expand_and_resolve(dir, base_dir))
                .collect(),
            discovered: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current pool: explicit entries first, then directory
    /// images not listed explicitly.
    #[must_use]
    pub fn wallpapers(&self) -> Vec<Wallpaper> {
        let listed: HashSet<&Path> = self.explicit.iter().map(Wallpaper::path).collect();
        let mut pool = self.explicit.clone();
        let mut discovered = self.discovered.lock();

        for dir in &self.directories {
            for image in discover_images(&dir.to_string_lossy()) {
                if listed.contains(image.as_path()) {
                    continue;
                }
                let wallpaper = discovered
                    .entry(image)
                    .or_insert_with_key(|path| Wallpaper::new(path.clone()));
                if !pool.contains(wallpaper) {
                    pool.push(wallpaper.clone());
                }
            }
        }

        tracing::debug!(wallpapers = pool.len(), "resolved wallpaper pool");
        pool
    }
}

impl WallpaperProvider for ConfigPool {
    fn request_wallpapers(&self) -> Vec<Wallpaper> { self.wallpapers() }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::WallpaperEntry;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_explicit_entries_override_directory_scan() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.png");
        let config = CyclerConfig {
            wallpapers: vec![WallpaperEntry {
                path: "a.jpg".to_string(),
                priority: 5,
                ..WallpaperEntry::default()
            }],
            directories: vec![".".to_string()],
            ..CyclerConfig::default()
        };

        let pool = ConfigPool::new(&config, dir.path()).wallpapers();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].priority, 5);
        assert!(pool[1].path.ends_with("b.png"));
        assert_eq!(pool[1].priority, Wallpaper::DEFAULT_PRIORITY);
    }

    #[test]
    fn test_rescan_keeps_identity_and_picks_up_new_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1.jpg");
        let config = CyclerConfig {
            directories: vec![dir.path().to_string_lossy().into_owned()],
            ..CyclerConfig::default()
        };
        let pool = ConfigPool::new(&config, Path::new("/"));

        let first = pool.request_wallpapers();
        touch(dir.path(), "2.jpg");
        let second = pool.request_wallpapers();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn test_overlapping_directories_do_not_duplicate() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "x.jpg");
        let path = dir.path().to_string_lossy().into_owned();
        let config = CyclerConfig {
            directories: vec![path.clone(), path],
            ..CyclerConfig::default()
        };

        assert_eq!(ConfigPool::new(&config, Path::new("/")).wallpapers().len(), 1);
    }
}
