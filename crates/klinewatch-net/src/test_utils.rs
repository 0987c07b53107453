//! Test utilities for transport and protocol types
//!
//! Provides a scripted [`Fetch`] implementation and builders for server
//! answer payloads.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use url::Url;

use crate::transport::{Fetch, FetchResult};

/// A [`Fetch`] that answers from per-path queues.
///
/// Requests to a path with no queued answer never complete, like a stuck
/// connection. Every requested URL is recorded.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    answers: Arc<Mutex<HashMap<String, VecDeque<FetchResult>>>>,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next request to `path`
    pub fn respond(&self, path: &str, answer: FetchResult) {
        self.answers
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(answer);
    }

    /// All URLs requested so far, in order
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of all URLs requested so far, in order
    pub fn requested_paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|u| u.path().to_string())
            .collect()
    }

    /// Number of requests made to `path`
    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|u| u.path() == path).count()
    }
}

impl Fetch for ScriptedFetcher {
    async fn get(&self, url: Url) -> FetchResult {
        self.requests.lock().unwrap().push(url.clone());
        let next = self
            .answers
            .lock()
            .unwrap()
            .get_mut(url.path())
            .and_then(|q| q.pop_front());

        match next {
            Some(answer) => answer,
            None => std::future::pending().await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Payload builders
// ─────────────────────────────────────────────────────────────────

/// An OK package wrapping `data`
pub fn ok_package(data: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "status": {"code": "OK", "message": ""},
        "data": data,
    }))
    .unwrap()
}

/// A package with a non-OK status and no data
pub fn error_package(code: &str, message: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "status": {"code": code, "message": message},
    }))
    .unwrap()
}

pub fn login_payload(session_id: u64) -> Vec<u8> {
    ok_package(json!({
        "sessionId": session_id,
        "config": {"filters": [{"delta": 5.0, "volume": 100000.0}], "blacklist": []},
        "message": "welcome",
    }))
}

pub fn exchanges_payload(exchanges: &[&str]) -> Vec<u8> {
    ok_package(json!({"stockExchanges": exchanges, "message": ""}))
}

pub fn symbols_payload(exchange: &str, symbols: &[&str]) -> Vec<u8> {
    ok_package(json!({"stockExchange": exchange, "klines": symbols, "message": ""}))
}

pub fn detect_payload(detections: Vec<Value>) -> Vec<u8> {
    ok_package(json!({"detected": detections, "message": ""}))
}

pub fn ack_payload() -> Vec<u8> {
    ok_package(json!({"message": "ok"}))
}

/// A detection body for `exchange`/`symbol`
pub fn detection_json(exchange: &str, symbol: &str) -> Value {
    json!({
        "exchange": exchange,
        "symbol": symbol,
        "detectedAt": 1_704_700_000_000i64,
        "delta": 6.5,
        "volume": 1_250_000.0,
        "message": format!("{} {} moved 6.5%", exchange, symbol),
        "history": [],
    })
}
