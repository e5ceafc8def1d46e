//! JSON schema of the configuration file.

use crate::config::CyclerConfig;

/// Returns the pretty-printed JSON schema of [`CyclerConfig`].
#[must_use]
pub fn print_schema() -> String {
    let schema = schemars::schema_for!(CyclerConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}
