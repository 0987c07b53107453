//! Events published by the session engine for its consumers

use serde::Serialize;

use crate::types::{Detection, ExchangeId, SymbolId, UserConfig};

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl DiagnosticLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticLevel::Debug => "debug",
            DiagnosticLevel::Info => "info",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        }
    }
}

/// Notifications emitted by the session engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Login accepted; carries the server-side configuration for this user
    LoggedIn { config: UserConfig },

    /// Session ended (explicit logout or protocol failure)
    LoggedOut,

    /// Exchange catalog received
    ExchangeCatalog { exchanges: Vec<ExchangeId> },

    /// Symbol catalog received for one exchange
    SymbolCatalog {
        exchange: ExchangeId,
        symbols: Vec<SymbolId>,
    },

    /// Server returned an empty exchange catalog; nothing to poll
    CatalogEmpty,

    /// New detections (never empty)
    Detections { detections: Vec<Detection> },

    /// Human-readable log line for the event feed
    Diagnostic {
        level: DiagnosticLevel,
        message: String,
    },

    /// Engine is shutting down
    Shutdown,
}

impl SessionEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Diagnostic {
            level: DiagnosticLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Diagnostic {
            level: DiagnosticLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Diagnostic {
            level: DiagnosticLevel::Error,
            message: message.into(),
        }
    }

    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::LoggedIn { .. } => "logged_in",
            Self::LoggedOut => "logged_out",
            Self::ExchangeCatalog { .. } => "exchange_catalog",
            Self::SymbolCatalog { .. } => "symbol_catalog",
            Self::CatalogEmpty => "catalog_empty",
            Self::Detections { .. } => "detections",
            Self::Diagnostic { .. } => "diagnostic",
            Self::Shutdown => "shutdown",
        }
    }
}
