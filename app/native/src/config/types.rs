//! Configuration types and loading.
//!
//! The configuration file is JSONC: `//` and `/* */` comments are stripped
//! before parsing. Every field is optional and falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    APP_NAME, DEFAULT_AUTOCYCLE_INTERVAL_SECS, HISTORY_PERCENT_MAX, HISTORY_PERCENT_MIN,
    MIN_AUTOCYCLE_INTERVAL_SECS,
};
use crate::cycler::{
    Arrangement, ChangeType, CycleConditions, CyclerOptions, Placement, ScreenBounds,
    ScreenSettings, ScreensSettings, Wallpaper,
};
use crate::platform::path::expand_and_resolve;

// ============================================================================
// Screens
// ============================================================================

/// Settings and geometry of one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ScreenConfig {
    /// Pick a new wallpaper for this screen on every cycle.
    pub cycle_randomly: bool,

    /// Image shown while this screen is not cycling randomly.
    pub static_wallpaper: Option<String>,

    /// Conditions gating the static wallpaper. While they do not hold, the
    /// screen cycles randomly.
    pub static_conditions: CycleConditions,

    /// Left edge on the virtual desktop, in pixels.
    pub x: i32,

    /// Top edge on the virtual desktop, in pixels.
    pub y: i32,

    pub width: u32,

    pub height: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            cycle_randomly: true,
            static_wallpaper: None,
            static_conditions: CycleConditions::default(),
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }
}

impl ScreenConfig {
    #[must_use]
    pub const fn bounds(&self) -> ScreenBounds { ScreenBounds::new(self.x, self.y, self.width, self.height) }
}

// ============================================================================
// Wallpapers
// ============================================================================

/// A wallpaper listed explicitly in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WallpaperEntry {
    /// Image path. `~` and paths relative to the config file are resolved.
    pub path: String,

    /// Selection weight from 1 to 255. `0` never picks the wallpaper.
    pub priority: u8,

    pub enabled: bool,

    /// Span the image across every screen.
    pub multiscreen: bool,

    /// Zero-based screen indices this wallpaper must never be shown on.
    pub disabled_screens: Vec<usize>,

    pub placement: Placement,

    pub conditions: CycleConditions,
}

impl Default for WallpaperEntry {
    fn default() -> Self {
        Self {
            path: String::new(),
            priority: Wallpaper::DEFAULT_PRIORITY,
            enabled: true,
            multiscreen: false,
            disabled_screens: Vec::new(),
            placement: Placement::default(),
            conditions: CycleConditions::default(),
        }
    }
}

impl WallpaperEntry {
    /// Builds the cycler record for this entry.
    #[must_use]
    pub fn to_wallpaper(&self, base_dir: &Path) -> Wallpaper {
        Wallpaper::new(expand_and_resolve(&self.path, base_dir))
            .with_priority(self.priority)
            .with_activated(self.enabled)
            .with_multiscreen(self.multiscreen)
            .with_disabled_screens(self.disabled_screens.iter().copied())
            .with_placement(self.placement)
            .with_conditions(self.conditions.clone())
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration of the wallpaper cycler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CyclerConfig {
    /// JSON schema reference for editor support.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Seconds between two automatic cycles. At least 10.
    pub autocycle_interval: u64,

    /// Start autocycling when `wallcycle run` starts.
    pub autocycle_on_start: bool,

    /// Share of the wallpaper pool remembered to avoid repeats, in percent (1 to 80).
    pub history_size_percent: u8,

    /// Cycle when the screen geometry changes.
    pub cycle_on_topology_change: bool,

    /// How screens change on every cycle.
    pub change_type: ChangeType,

    /// How the desktop lays out the rendered image.
    pub arrangement: Arrangement,

    /// Where the rendered image is written. Defaults to the cache directory.
    pub output_path: Option<String>,

    /// Screens in index order. Empty means a single 1920x1080 screen.
    pub screens: Vec<ScreenConfig>,

    /// Explicitly configured wallpapers.
    pub wallpapers: Vec<WallpaperEntry>,

    /// Directories scanned for images on every cycle. Found images use
    /// default settings unless also listed in `wallpapers`.
    pub directories: Vec<String>,
}

impl Default for CyclerConfig {
    fn default() -> Self {
        Self {
            schema: None,
            autocycle_interval: DEFAULT_AUTOCYCLE_INTERVAL_SECS,
            autocycle_on_start: true,
            history_size_percent: HISTORY_PERCENT_MAX,
            cycle_on_topology_change: false,
            change_type: ChangeType::default(),
            arrangement: Arrangement::default(),
            output_path: None,
            screens: Vec::new(),
            wallpapers: Vec::new(),
            directories: Vec::new(),
        }
    }
}

impl CyclerConfig {
    /// Checks value ranges and screen references.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autocycle_interval < MIN_AUTOCYCLE_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "autocycleInterval must be at least {MIN_AUTOCYCLE_INTERVAL_SECS} seconds, got {}",
                self.autocycle_interval
            )));
        }

        if !(HISTORY_PERCENT_MIN..=HISTORY_PERCENT_MAX).contains(&self.history_size_percent) {
            return Err(ConfigError::Invalid(format!(
                "historySizePercent must be between {HISTORY_PERCENT_MIN} and {HISTORY_PERCENT_MAX}, got {}",
                self.history_size_percent
            )));
        }

        if let Some(index) = self.screens.iter().position(|s| s.width == 0 || s.height == 0) {
            return Err(ConfigError::Invalid(format!("screens[{index}] has an empty size")));
        }

        if let Some(index) = self
            .screens
            .iter()
            .position(|s| !s.cycle_randomly && s.static_wallpaper.as_deref().is_none_or(str::is_empty))
        {
            return Err(ConfigError::Invalid(format!(
                "screens[{index}] does not cycle randomly but has no staticWallpaper"
            )));
        }

        let screen_count = self.screen_count();
        for entry in &self.wallpapers {
            if entry.path.trim().is_empty() {
                return Err(ConfigError::Invalid("a wallpaper entry has an empty path".to_string()));
            }
            if let Some(screen) = entry.disabled_screens.iter().find(|&&s| s >= screen_count) {
                return Err(ConfigError::Invalid(format!(
                    "wallpaper {} disables screen {screen}, but only {screen_count} screen(s) are configured",
                    entry.path
                )));
            }
        }

        Ok(())
    }

    /// Number of configured screens, at least one.
    #[must_use]
    pub fn screen_count(&self) -> usize { self.screens.len().max(1) }

    /// Geometry of every configured screen.
    #[must_use]
    pub fn screen_bounds(&self) -> Vec<ScreenBounds> {
        if self.screens.is_empty() {
            return vec![ScreenConfig::default().bounds()];
        }
        self.screens.iter().map(ScreenConfig::bounds).collect()
    }

    /// Builds the per-screen cycling settings.
    #[must_use]
    pub fn to_screens(&self, base_dir: &Path) -> ScreensSettings {
        if self.screens.is_empty() {
            return ScreensSettings::all_random(&self.screen_bounds());
        }

        let screens = self
            .screens
            .iter()
            .map(|screen| match screen.static_wallpaper.as_deref() {
                Some(path) if !screen.cycle_randomly => {
                    let wallpaper = Wallpaper::new(expand_and_resolve(path, base_dir))
                        .with_conditions(screen.static_conditions.clone());
                    ScreenSettings::fixed(wallpaper, screen.bounds())
                }
                _ => ScreenSettings::random(screen.bounds()),
            })
            .collect();

        ScreensSettings::new(screens)
    }

    /// Builds the cycler options.
    #[must_use]
    pub fn to_options(&self, base_dir: &Path) -> CyclerOptions {
        let defaults = CyclerOptions::default();
        CyclerOptions {
            autocycle_interval: Duration::from_secs(self.autocycle_interval),
            history_size_percent: self.history_size_percent,
            cycle_on_topology_change: self.cycle_on_topology_change,
            change_type: self.change_type,
            arrangement: self.arrangement,
            output_path: self
                .output_path
                .as_deref()
                .map_or(defaults.output_path, |path| expand_and_resolve(path, base_dir)),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error("No configuration file found. Expected at ~/.config/{APP_NAME}/config.jsonc or ~/.{APP_NAME}.json")]
    NotFound,

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but holds out-of-range values.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/wallcycle/config.jsonc` or `config.json`, when set
/// 2. `~/.config/wallcycle/config.jsonc` or `config.json`
/// 3. The platform config directory, e.g. `~/Library/Application Support/wallcycle/`
/// 4. `~/.wallcycle.jsonc` or `~/.wallcycle.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let mut app_dirs = Vec::new();
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        app_dirs.push(PathBuf::from(xdg_config).join(APP_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        app_dirs.push(home.join(".config").join(APP_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        app_dirs.push(config_dir.join(APP_NAME));
    }

    for dir in app_dirs {
        for filename in CONFIG_FILE_NAMES {
            push_unique(&mut paths, dir.join(filename));
        }
    }

    if let Some(home) = dirs::home_dir() {
        for extension in ["jsonc", "json"] {
            push_unique(&mut paths, home.join(format!(".{APP_NAME}.{extension}")));
        }
    }

    paths
}

/// Loads and validates the configuration at `path`.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, `Io` or `Parse`
/// if it cannot be read, and `Invalid` if validation fails.
pub fn load_config_from_path(path: &Path) -> Result<(CyclerConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let config: CyclerConfig = serde_json::from_reader(reader)?;
    config.validate()?;

    Ok((config, path.to_path_buf()))
}

/// Loads the configuration from the first existing file in [`config_paths`].
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no file exists, or the error of the
/// first file found.
pub fn load_config() -> Result<(CyclerConfig, PathBuf), ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .map_or(Err(ConfigError::NotFound), |path| load_config_from_path(&path))
}
