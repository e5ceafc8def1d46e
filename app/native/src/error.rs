//! Error types for wallcycle.
//!
//! [`WallcycleError`] is what the CLI reports. It serializes with a `kind`
//! tag so scripts can branch on the failure.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::cycler::CycleError;

/// Errors that can occur during application execution.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum WallcycleError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A cycle could not be performed.
    #[error("Cycle error: {0}")]
    CycleError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<ConfigError> for WallcycleError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<CycleError> for WallcycleError {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::InvalidInput(msg) => Self::InvalidArguments(msg),
            other => Self::CycleError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for WallcycleError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for WallcycleError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for WallcycleError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for WallcycleError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}
