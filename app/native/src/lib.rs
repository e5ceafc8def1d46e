//! wallcycle - Weighted random wallpaper cycling across one or more screens.
//!
//! The [`cycler`] module holds the engine: weighted selection with history,
//! per-screen layout strategies, the autocycle timer and the single-flight
//! build pipeline. [`render`] provides the default image composer and desktop
//! integration, [`config`] the JSONC configuration, and [`cli`] the binary's
//! commands.

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod cycler;
pub mod error;
pub mod platform;
pub mod render;
pub mod schema;
