//! Application-wide constants.

/// Application name, used for config and cache directories.
pub const APP_NAME: &str = "wallcycle";

/// Shortest interval accepted between two automatic cycles, in seconds.
pub const MIN_AUTOCYCLE_INTERVAL_SECS: u64 = 10;

/// Default interval between two automatic cycles, in seconds.
pub const DEFAULT_AUTOCYCLE_INTERVAL_SECS: u64 = 30 * 60;

/// Lowest accepted share of the live pool kept as cycle history, in percent.
pub const HISTORY_PERCENT_MIN: u8 = 1;

/// Highest accepted share of the live pool kept as cycle history, in percent.
pub const HISTORY_PERCENT_MAX: u8 = 80;

/// Smallest capacity the cycle history is ever sized to.
pub const HISTORY_MIN_SIZE: usize = 3;

/// Scale factor handed to the composer for every build.
pub const BUILD_SCALE_FACTOR: f32 = 1.0;

/// File name of the rendered desktop image inside the cache directory.
pub const OUTPUT_FILE_NAME: &str = "wallpaper.png";

/// Image file extensions picked up when scanning wallpaper directories.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
