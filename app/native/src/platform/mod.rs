//! Host platform helpers.
//!
//! - [`path`] - Shell-like path expansion for configured paths

pub mod path;

pub use path::{expand, expand_and_resolve};
