//! Configuration for wallcycle.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! A file given with `--config` must exist; otherwise the standard locations
//! are searched and defaults are used when none exists.

pub mod pool;
pub mod template;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use pool::ConfigPool;
pub use types::{
    ConfigError, CyclerConfig, ScreenConfig, WallpaperEntry, config_paths, load_config,
    load_config_from_path,
};

/// A configuration together with where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: CyclerConfig,
    /// File the configuration was read from, `None` for defaults.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory relative configured paths are resolved against: the config
    /// file's directory, or the working directory for defaults.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default()
    }
}

/// Global configuration instance, loaded once per process.
static CONFIG: OnceLock<LoadedConfig> = OnceLock::new();

/// Custom config path override (set via CLI --config flag).
static CUSTOM_CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom configuration file path to use instead of the default search paths.
///
/// Must be called before [`init`]. Returns `false` if a path was already set.
pub fn set_custom_config_path(path: PathBuf) -> bool { CUSTOM_CONFIG_PATH.set(path).is_ok() }

fn load() -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = CUSTOM_CONFIG_PATH.get() {
        let (config, path) = load_config_from_path(path)?;
        return Ok(LoadedConfig { config, path: Some(path) });
    }

    match load_config() {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(LoadedConfig { config, path: Some(path) })
        }
        Err(ConfigError::NotFound) => {
            tracing::warn!("no configuration file found, using defaults");
            Ok(LoadedConfig::default())
        }
        Err(err) => Err(err),
    }
}

/// Loads the configuration on first use and returns it.
///
/// # Errors
///
/// Returns a `ConfigError` if a configuration file exists but is unreadable
/// or invalid, or if the `--config` file does not exist.
pub fn init() -> Result<&'static LoadedConfig, ConfigError> {
    if let Some(loaded) = CONFIG.get() {
        return Ok(loaded);
    }
    let loaded = load()?;
    Ok(CONFIG.get_or_init(|| loaded))
}
