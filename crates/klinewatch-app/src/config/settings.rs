//! Settings parser for klinewatch/config.toml

use std::path::{Path, PathBuf};

use url::Url;

use super::types::Settings;
use klinewatch_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "klinewatch";

const DEFAULT_CONFIG: &str = r#"# klinewatch configuration

[server]
base_url = "http://localhost:59923"
request_timeout_ms = 30000

[account]
user = ""
password = ""

[timing]
retry_delay_ms = 5000     # Wait before logging in again after a failure
poll_interval_ms = 5000   # Wait between detection polls
tick_interval_ms = 1000   # How often finished requests are collected
retention_ms = 600000     # Unclaimed answers are dropped after this long
"#;

/// Values given on the command line, applied over the config file
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// `<config_dir>/klinewatch/config.toml`, or a relative fallback when the
/// platform has no config directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
        .join(CONFIG_FILENAME)
}

/// Load settings from `config_path`
///
/// A missing file yields defaults. An unreadable or malformed file is
/// logged and also yields defaults.
pub fn load_settings(config_path: &Path) -> Settings {
    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Write the default config file unless one exists.
///
/// Returns `true` when a file was created.
pub fn init_config_file(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(dir) = config_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::config(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;

    info!("Created default config at {:?}", config_path);
    Ok(true)
}

impl Settings {
    /// Apply command-line values; `None` leaves the file value alone
    pub fn apply_overrides(&mut self, overrides: SettingsOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.server.base_url = base_url;
        }
        if let Some(user) = overrides.user {
            self.account.user = user;
        }
        if let Some(password) = overrides.password {
            self.account.password = password;
        }
    }

    /// Parsed server base URL
    pub fn server_url(&self) -> Result<Url> {
        let url = Url::parse(&self.server.base_url)
            .map_err(|e| Error::invalid_url(&self.server.base_url, e.to_string()))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::invalid_url(
                &self.server.base_url,
                format!("unsupported scheme '{}'", other),
            )),
        }
    }

    /// Check that the engine can start with these settings
    pub fn validate(&self) -> Result<()> {
        self.server_url()?;

        if !self.account.is_complete() {
            return Err(Error::MissingCredentials);
        }

        if self.server.request_timeout_ms == 0 {
            return Err(Error::config_invalid("request_timeout_ms must be positive"));
        }

        Ok(())
    }
}
