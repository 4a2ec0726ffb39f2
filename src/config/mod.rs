//! Configuration module for the sprite codec
//!
//! Provides types, discovery and loading for `sprc.toml`.

pub mod loader;
pub mod schema;

pub use loader::{find_config, find_config_from, load_config, merge_cli_overrides, CliOverrides, ConfigError};
pub use schema::*;
