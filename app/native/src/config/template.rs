//! Configuration template generation.

use std::fs;
use std::path::Path;

/// Generates a JSONC configuration template documenting every option.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// wallcycle configuration
// This file uses JSONC format (JSON with comments).
// Every option is optional; the values below are the defaults.
{
  // Seconds between two automatic cycles (at least 10).
  "autocycleInterval": 1800,

  // Start autocycling when `wallcycle run` starts.
  "autocycleOnStart": true,

  // Share of the wallpaper pool remembered to avoid repeats, 1 to 80 percent.
  "historySizePercent": 80,

  // Cycle when the screen geometry changes.
  "cycleOnTopologyChange": false,

  // "all": every screen changes, "allCloned": every screen shows the same
  // image, "oneByOne": one screen changes per cycle, round robin.
  "changeType": "all",

  // How the desktop lays out the rendered image: "span", "tile", "stretch", "center".
  "arrangement": "span",

  // Where the rendered image is written (defaults to the cache directory).
  // "outputPath": "~/.cache/wallcycle/wallpaper.png",

  // Screens in index order. Without screens, one 1920x1080 screen is assumed.
  "screens": [
    // { "x": 0, "y": 0, "width": 2560, "height": 1440 },
    // {
    //   "x": 2560, "width": 1920, "height": 1080,
    //   "cycleRandomly": false,
    //   "staticWallpaper": "~/Pictures/fixed.png",
    //   "staticConditions": { "weekdays": ["Sat", "Sun"] }
    // }
  ],

  // Folders scanned for .jpg, .jpeg and .png images on every cycle.
  "directories": [
    // "~/Pictures/wallpapers"
  ],

  // Wallpapers with their own settings.
  "wallpapers": [
    // {
    //   "path": "~/Pictures/panorama.jpg",
    //   "priority": 100,            // 1 to 255, 0 = never picked
    //   "enabled": true,
    //   "multiscreen": true,        // span every screen
    //   "disabledScreens": [],      // zero-based screen indices
    //   "placement": "fill",        // "fill", "fit", "stretch", "center"
    //   "conditions": {
    //     "activeBetween": { "start": "20:00:00", "end": "06:00:00" },
    //     "weekdays": ["Mon", "Tue", "Wed", "Thu", "Fri"],
    //     "requiresPath": "/mnt/nas"
    //   }
    // }
  ]
}
"#
    .to_string()
}

/// Writes the template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, generate_config_template())
}
