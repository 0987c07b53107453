//! Configuration file parsing for klinewatch
//!
//! Supports:
//! - `<config_dir>/klinewatch/config.toml` - Server, account and timing settings
//! - Command-line overrides applied on top of the file

pub mod settings;
pub mod types;

pub use settings::{default_config_path, init_config_file, load_settings, SettingsOverrides};
pub use types::*;
