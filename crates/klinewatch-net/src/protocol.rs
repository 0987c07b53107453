//! Server answer envelope and typed data bodies
//!
//! Every answer is a JSON package:
//!
//! ```json
//! {"status": {"code": "OK", "message": ""}, "data": { ... }}
//! ```
//!
//! Parsing distinguishes three failure modes so they can be reported
//! separately: the package itself is malformed, the server returned a
//! non-OK status, or the data body does not match the expected shape.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use klinewatch_core::{Detection, ExchangeId, SymbolId, UserConfig};

use crate::query::SessionId;

/// Application-level status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Ok,
    BadRequest,
    Unauthorized,
    NotFound,
    InternalError,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "BAD_REQUEST",
            StatusCode::Unauthorized => "UNAUTHORIZED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::InternalError => "INTERNAL_ERROR",
            StatusCode::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusAnswer {
    pub code: StatusCode,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct Package {
    status: StatusAnswer,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Why an answer could not be turned into typed data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnswerError {
    #[error("Error parsing package: {0}")]
    Package(String),

    #[error("Server answer with error. Code: {code}. Error: {message}")]
    Status { code: StatusCode, message: String },

    #[error("Error parsing data: {0}")]
    Data(String),
}

/// Parse an answer package and decode its data body as `T`
pub fn parse_answer<T: DeserializeOwned>(payload: &[u8]) -> Result<T, AnswerError> {
    let package: Package =
        serde_json::from_slice(payload).map_err(|e| AnswerError::Package(e.to_string()))?;

    if package.status.code != StatusCode::Ok {
        return Err(AnswerError::Status {
            code: package.status.code,
            message: package.status.message,
        });
    }

    let data = package
        .data
        .ok_or_else(|| AnswerError::Data("missing data body".to_string()))?;

    serde_json::from_value(data).map_err(|e| AnswerError::Data(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────
// Data bodies
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAnswer {
    pub session_id: SessionId,
    #[serde(default)]
    pub config: UserConfig,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockExchangesAnswer {
    pub stock_exchanges: Vec<ExchangeId>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KLinesIdListAnswer {
    pub stock_exchange: ExchangeId,
    pub klines: Vec<SymbolId>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectAnswer {
    pub detected: Vec<Detection>,
    #[serde(default)]
    pub message: String,
}

/// Acknowledgement for config push and logout
#[derive(Debug, Clone, Deserialize)]
pub struct AckAnswer {
    #[serde(default)]
    pub message: String,
}
