//! Parsing and validation of `tessera.toml` placer configuration files.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable [`PlacerConfig`]. The CLI applies its flags on top of the loaded
//! values.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config};
pub use types::*;
