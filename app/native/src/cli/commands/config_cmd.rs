//! Config CLI commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::config::config_paths;
use crate::config::template::{create_config_file, generate_config_template};
use crate::error::WallcycleError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Write a documented configuration file.
    #[command(after_long_help = r#"Examples:
  wallcycle config init                          # Create config at the default location
  wallcycle config init --force                  # Overwrite an existing config
  wallcycle config init --path ./wallcycle.jsonc # Create at a custom path
  wallcycle config init --stdout                 # Print the template"#)]
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long, short)]
        force: bool,

        /// Where to write the file instead of ~/.config/wallcycle/config.jsonc.
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the template to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show where configuration files are searched for.
    Path,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be written.
pub fn execute(cmd: &ConfigCommands) -> Result<(), WallcycleError> {
    match cmd {
        ConfigCommands::Init { stdout: true, .. } => {
            println!("{}", generate_config_template());
            Ok(())
        }
        ConfigCommands::Init { force, path, .. } => {
            let target = path
                .clone()
                .or_else(|| config_paths().into_iter().next())
                .unwrap_or_else(|| PathBuf::from("config.jsonc"));
            init_config(&target, *force)?;
            println!("Configuration file created at: {}", target.display());
            Ok(())
        }
        ConfigCommands::Path => {
            show_config_paths();
            Ok(())
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<(), WallcycleError> {
    if path.exists() && !force {
        return Err(WallcycleError::ConfigError(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            path.display()
        )));
    }

    create_config_file(path).map_err(|e| {
        WallcycleError::ConfigError(format!("Failed to create config file {}: {e}", path.display()))
    })
}

fn show_config_paths() {
    println!("Configuration file search paths (in priority order):\n");

    let paths = config_paths();
    let active = paths.iter().position(|path| path.exists());

    for (i, path) in paths.iter().enumerate() {
        let marker = match active {
            Some(index) if index == i => " (active)",
            _ if path.exists() => " (exists)",
            _ => "",
        };
        println!("  {}. {}{}", i + 1, path.display(), marker);
    }

    if active.is_none() {
        println!("\nNo configuration file found, defaults are used.");
        println!("Run 'wallcycle config init' to create one.");
    }
}
