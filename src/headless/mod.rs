//! Headless mode - JSON event output
//!
//! Every session event is written to stdout as NDJSON (newline-delimited
//! JSON), one event per line. Each event has an "event" field indicating its
//! type, along with event-specific data and a millisecond timestamp.
//!
//! # Example Output
//!
//! ```json
//! {"event":"logged_in","config":{"filters":[],"blacklist":[]},"timestamp":1704700001000}
//! {"event":"exchange_catalog","exchanges":["BINANCE"],"timestamp":1704700002000}
//! {"event":"diagnostic","level":"info","message":"Detect: 2 detection(s)","timestamp":1704700003000}
//! ```

pub mod runner;

use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use klinewatch_core::{Detection, DiagnosticLevel, ExchangeId, SessionEvent, SymbolId, UserConfig};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Session opened; carries the server-assigned config
    LoggedIn { config: UserConfig, timestamp: i64 },

    /// Session closed or lost
    LoggedOut { timestamp: i64 },

    ExchangeCatalog {
        exchanges: Vec<ExchangeId>,
        timestamp: i64,
    },

    SymbolCatalog {
        exchange: ExchangeId,
        symbols: Vec<SymbolId>,
        timestamp: i64,
    },

    /// The server has no exchanges; the session stays idle
    CatalogEmpty { timestamp: i64 },

    Detections {
        detections: Vec<Detection>,
        timestamp: i64,
    },

    Diagnostic {
        level: DiagnosticLevel,
        message: String,
        timestamp: i64,
    },

    /// Runner-level error (bad stdin command, startup failure)
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    Shutdown { timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = self.write_to(&mut stdout) {
            error!("Failed to write headless event to stdout: {}", e);
        }
    }

    /// Write this event as one NDJSON line and flush
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let json = serde_json::to_string(self)?;
        writeln!(out, "{}", json)?;
        out.flush()
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl From<SessionEvent> for HeadlessEvent {
    fn from(event: SessionEvent) -> Self {
        let timestamp = Self::now();
        match event {
            SessionEvent::LoggedIn { config } => Self::LoggedIn { config, timestamp },
            SessionEvent::LoggedOut => Self::LoggedOut { timestamp },
            SessionEvent::ExchangeCatalog { exchanges } => Self::ExchangeCatalog {
                exchanges,
                timestamp,
            },
            SessionEvent::SymbolCatalog { exchange, symbols } => Self::SymbolCatalog {
                exchange,
                symbols,
                timestamp,
            },
            SessionEvent::CatalogEmpty => Self::CatalogEmpty { timestamp },
            SessionEvent::Detections { detections } => Self::Detections {
                detections,
                timestamp,
            },
            SessionEvent::Diagnostic { level, message } => Self::Diagnostic {
                level,
                message,
                timestamp,
            },
            SessionEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }
}
