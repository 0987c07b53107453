//! Query model and request ID allocation
//!
//! This module provides:
//! - Process-wide request ID allocation
//! - Typed request descriptors for every server endpoint
//! - URL building (path + query parameters) for each request

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use url::Url;

use klinewatch_core::prelude::*;
use klinewatch_core::{ExchangeId, UserConfig};

/// Identifier assigned to a request when it is sent
pub type RequestId = u64;

/// Server-assigned session identifier; `0` means "no session"
pub type SessionId = u64;

/// Global request ID counter
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique request ID
pub fn next_request_id() -> RequestId {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Logical kind of a query, used to interpret its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Login,
    Logout,
    ListExchanges,
    ListSymbols,
    PushConfig,
    PollDetections,
}

impl QueryKind {
    /// Label used as prefix in diagnostic messages
    pub fn label(&self) -> &'static str {
        match self {
            QueryKind::Login => "Login",
            QueryKind::Logout => "Logout",
            QueryKind::ListExchanges => "StockExchanges",
            QueryKind::ListSymbols => "KLinesIDList",
            QueryKind::PushConfig => "Config",
            QueryKind::PollDetections => "Detect",
        }
    }
}

/// Request descriptors understood by the detector server
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Open a session
    Login { user: String, password: String },
    /// Close the session
    Logout { session_id: SessionId },
    /// Enumerate exchanges
    ListExchanges { session_id: SessionId },
    /// Enumerate k-line symbols of one exchange
    ListSymbols {
        session_id: SessionId,
        exchange: ExchangeId,
    },
    /// Store the user's filter/black-list config
    PushConfig {
        session_id: SessionId,
        config: UserConfig,
    },
    /// Fetch detections since the previous poll
    PollDetections { session_id: SessionId },
}

impl Query {
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Login { .. } => QueryKind::Login,
            Query::Logout { .. } => QueryKind::Logout,
            Query::ListExchanges { .. } => QueryKind::ListExchanges,
            Query::ListSymbols { .. } => QueryKind::ListSymbols,
            Query::PushConfig { .. } => QueryKind::PushConfig,
            Query::PollDetections { .. } => QueryKind::PollDetections,
        }
    }

    /// Session the query runs in; `None` for Login
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Query::Login { .. } => None,
            Query::Logout { session_id }
            | Query::ListExchanges { session_id }
            | Query::ListSymbols { session_id, .. }
            | Query::PushConfig { session_id, .. }
            | Query::PollDetections { session_id } => Some(*session_id),
        }
    }

    /// Endpoint path relative to the server base URL
    pub fn path(&self) -> &'static str {
        match self {
            Query::Login { .. } => "/login",
            Query::Logout { .. } => "/logout",
            Query::ListExchanges { .. } => "/stockexchanges",
            Query::ListSymbols { .. } => "/klinesidlist",
            Query::PushConfig { .. } => "/config",
            Query::PollDetections { .. } => "/detect",
        }
    }

    /// Query-string parameters in the order they are appended
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Query::Login { user, password } => {
                vec![("user", user.clone()), ("password", password.clone())]
            }
            Query::Logout { session_id }
            | Query::ListExchanges { session_id }
            | Query::PollDetections { session_id } => {
                vec![("sessionId", session_id.to_string())]
            }
            Query::ListSymbols {
                session_id,
                exchange,
            } => vec![
                ("sessionId", session_id.to_string()),
                ("stockExchange", exchange.to_string()),
            ],
            Query::PushConfig { session_id, config } => {
                let blob = serde_json::to_string(config).unwrap_or_else(|e| {
                    warn!("Failed to serialize user config, sending empty object: {}", e);
                    "{}".to_string()
                });
                vec![("sessionId", session_id.to_string()), ("config", blob)]
            }
        }
    }

    /// Build the full GET URL against `base`, keeping any path prefix of `base`
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, self.path()));
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.params() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }

    /// Get a human-readable description (never contains credentials)
    pub fn description(&self) -> String {
        match self {
            Query::Login { user, .. } => format!("login as '{}'", user),
            Query::Logout { session_id } => format!("logout session {}", session_id),
            Query::ListExchanges { session_id } => {
                format!("list exchanges (session {})", session_id)
            }
            Query::ListSymbols {
                session_id,
                exchange,
            } => format!("list symbols of {} (session {})", exchange, session_id),
            Query::PushConfig { session_id, .. } => format!("push config (session {})", session_id),
            Query::PollDetections { session_id } => {
                format!("poll detections (session {})", session_id)
            }
        }
    }
}

/// A query that has been handed to the transport and awaits its outcome
#[derive(Debug, Clone)]
pub struct SentQuery {
    pub id: RequestId,
    pub query: Query,
    pub sent_at: Instant,
}

impl SentQuery {
    pub fn new(id: RequestId, query: Query) -> Self {
        Self {
            id,
            query,
            sent_at: Instant::now(),
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.query.kind()
    }
}
