//! Domain types shared by the protocol engine and its consumers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a stock exchange as enumerated by the server (e.g. "BINANCE").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(pub String);

impl ExchangeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExchangeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a tradable k-line series within one exchange (e.g. "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-exchange detection threshold.
///
/// `exchange: None` applies the thresholds to every exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KLineFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeId>,
    pub delta: f64,
    pub volume: f64,
}

/// A black-listed exchange/symbol pair; detections for it are suppressed server side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub exchange: ExchangeId,
    pub symbol: SymbolId,
}

/// Filter and black-list preferences assigned by the server on login.
///
/// Fields the client does not understand are kept in `extra` so that a
/// config pushed back to the server carries them unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default)]
    pub filters: Vec<KLineFilter>,

    #[serde(default)]
    pub blacklist: Vec<BlacklistEntry>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserConfig {
    /// Whether `symbol` on `exchange` is black-listed.
    pub fn is_blacklisted(&self, exchange: &ExchangeId, symbol: &SymbolId) -> bool {
        self.blacklist
            .iter()
            .any(|e| &e.exchange == exchange && &e.symbol == symbol)
    }

    /// Add a black-list entry; returns false if it was already present.
    pub fn add_to_blacklist(&mut self, exchange: ExchangeId, symbol: SymbolId) -> bool {
        if self.is_blacklisted(&exchange, &symbol) {
            return false;
        }
        self.blacklist.push(BlacklistEntry { exchange, symbol });
        true
    }

    /// Remove a black-list entry; returns false if it was not present.
    pub fn remove_from_blacklist(&mut self, exchange: &ExchangeId, symbol: &SymbolId) -> bool {
        let before = self.blacklist.len();
        self.blacklist
            .retain(|e| !(&e.exchange == exchange && &e.symbol == symbol));
        self.blacklist.len() != before
    }
}

/// One price bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KLine {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A server-reported anomaly for one exchange/symbol pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub exchange: ExchangeId,
    pub symbol: SymbolId,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub detected_at: DateTime<Utc>,

    /// Relative price move over the detection window
    pub delta: f64,

    /// Traded volume over the detection window
    pub volume: f64,

    /// Human-readable summary produced by the detector
    #[serde(default)]
    pub message: String,

    /// Recent bars leading up to the detection, oldest first
    #[serde(default)]
    pub history: Vec<KLine>,
}
