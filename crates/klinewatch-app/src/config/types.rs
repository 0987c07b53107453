//! Configuration types for klinewatch
//!
//! Defines:
//! - `Settings` - Application settings (`config.toml`)
//! - Section structs for server, account and timing

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application settings (config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub account: AccountSettings,

    #[serde(default)]
    pub timing: TimingSettings,
}

/// Detector server connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Base URL every request path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_base_url() -> String {
    "http://localhost:59923".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Login credentials
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AccountSettings {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl AccountSettings {
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for AccountSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSettings")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Engine timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingSettings {
    /// Delay before re-sending Login after any failure
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Delay between detection polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Interval of the outcome-draining tick
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How long an unclaimed outcome is kept
    #[serde(default = "default_retention_ms")]
    pub retention_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            retention_ms: default_retention_ms(),
        }
    }
}

impl TimingSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Tick interval, clamped to at least 10ms
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_retention_ms() -> u64 {
    600_000
}
