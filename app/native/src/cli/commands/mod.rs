//! CLI command definitions using Clap.
//!
//! - `cycle` - Commands driving the wallpaper cycler
//! - `config_cmd` - Configuration file management

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::constants::APP_NAME;
use crate::error::WallcycleError;
use crate::{config, schema};

pub mod config_cmd;
pub mod cycle;

pub use config_cmd::ConfigCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// wallcycle - Weighted random wallpaper cycling across screens.
#[derive(Parser, Debug)]
#[command(name = "wallcycle")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Log debug output to stderr. `RUST_LOG` is used otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Cycle wallpapers until interrupted.
    ///
    /// Applies a random selection right away, then keeps cycling every
    /// `autocycleInterval` seconds when `autocycleOnStart` is set.
    Run,

    /// Apply a random selection once.
    Next,

    /// Apply the given images.
    ///
    /// Singlescreen images fill the screens in order, repeating the last one.
    /// With --multiscreen, the first image spans every screen.
    #[command(after_long_help = r#"Examples:
  wallcycle set ~/Pictures/forest.jpg                  # Same image on every screen
  wallcycle set left.jpg right.jpg                     # One image per screen
  wallcycle set --multiscreen ~/Pictures/panorama.jpg  # Span every screen"#)]
    Set {
        /// Image files to apply.
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<String>,

        /// Treat the images as spanning every screen.
        #[arg(long, short)]
        multiscreen: bool,
    },

    /// Check whether the wallpaper pool can satisfy every screen.
    Check,

    /// Print the resolved wallpaper pool as JSON.
    List,

    /// Configuration file management commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(wallcycle completions --shell zsh)"
    ///   wallcycle completions --shell fish > ~/.config/fish/completions/wallcycle.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), WallcycleError> {
        if let Some(path) = self.config_path() {
            if !path.exists() {
                return Err(WallcycleError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path);
        }

        match &self.command {
            Commands::Run => cycle::run(config::init()?),
            Commands::Next => cycle::next(config::init()?),
            Commands::Set { paths, multiscreen } => cycle::set(config::init()?, paths, *multiscreen),
            Commands::Check => cycle::check(config::init()?),
            Commands::List => cycle::list(config::init()?),
            Commands::Config(cmd) => config_cmd::execute(cmd),

            Commands::Schema => {
                println!("{}", schema::print_schema());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }
}
