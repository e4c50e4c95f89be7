//! Storage infrastructure: the optional TOML configuration file.
//!
//! The file only supplies values; merging them with defaults and CLI
//! overrides happens in `main.rs`.

pub mod config;

pub use config::{load_config, parse_config, ConfigError, FileConfig};
