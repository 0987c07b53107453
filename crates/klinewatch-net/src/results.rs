//! Result correlation store
//!
//! Completions of in-flight requests arrive on tokio worker tasks while the
//! engine reads them from its own message loop. Outcomes are parked here,
//! keyed by [`RequestId`], until the engine takes them.
//!
//! Successes and failures live in separate maps, each behind its own lock.
//! Reads are destructive. Entries that nobody takes (the session was reset
//! while the request was in flight) are dropped by [`ResultStore::prune`]
//! once they exceed the retention window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use klinewatch_core::prelude::*;

use crate::query::RequestId;

/// Default retention for parked outcomes (10 minutes)
pub const DEFAULT_RETENTION: Duration = Duration::from_millis(600_000);

/// Terminal result of one network call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Response body of a successful (2xx) call
    Success {
        payload: Vec<u8>,
        timestamp: DateTime<Utc>,
    },
    /// Transport error or non-2xx response. `code` is the HTTP status, or 0
    /// when no response was received.
    Failure {
        code: u16,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl Outcome {
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self::Success {
            payload: payload.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self::Failure {
            code,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

struct Entry {
    outcome: Outcome,
    added_at: Instant,
}

type EntryMap = HashMap<RequestId, Entry>;

/// Lock-protected maps of parked outcomes
pub struct ResultStore {
    successes: Mutex<EntryMap>,
    failures: Mutex<EntryMap>,
    retention: Duration,
}

impl ResultStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            successes: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// Park an outcome for `id`.
    ///
    /// Returns false (and keeps the existing entry) if an outcome of the same
    /// kind is already parked for `id`.
    pub fn deposit(&self, id: RequestId, outcome: Outcome) -> bool {
        let map = if outcome.is_success() {
            &self.successes
        } else {
            &self.failures
        };
        let mut map = map.lock().unwrap_or_else(|e| e.into_inner());

        if map.contains_key(&id) {
            warn!("Duplicate outcome for request #{} ignored", id);
            return false;
        }

        map.insert(
            id,
            Entry {
                outcome,
                added_at: Instant::now(),
            },
        );
        true
    }

    /// Remove and return the success outcome for `id`, if any
    pub fn take_success(&self, id: RequestId) -> Option<Outcome> {
        take_from(&self.successes, id)
    }

    /// Remove and return the failure outcome for `id`, if any
    pub fn take_failure(&self, id: RequestId) -> Option<Outcome> {
        take_from(&self.failures, id)
    }

    /// Remove and return whichever outcome is parked for `id`
    pub fn take(&self, id: RequestId) -> Option<Outcome> {
        self.take_success(id).or_else(|| self.take_failure(id))
    }

    /// Drop entries older than the retention window. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    /// Same as [`prune`](Self::prune) with an explicit "now"
    pub fn prune_at(&self, now: Instant) -> usize {
        let dropped = prune_map(&self.successes, now, self.retention)
            + prune_map(&self.failures, now, self.retention);
        if dropped > 0 {
            debug!("Pruned {} stale outcome(s)", dropped);
        }
        dropped
    }

    /// Number of parked outcomes (both kinds)
    pub fn len(&self) -> usize {
        let successes = self.successes.lock().unwrap_or_else(|e| e.into_inner()).len();
        let failures = self.failures.lock().unwrap_or_else(|e| e.into_inner()).len();
        successes + failures
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

fn take_from(map: &Mutex<EntryMap>, id: RequestId) -> Option<Outcome> {
    map.lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(&id)
        .map(|entry| entry.outcome)
}

fn prune_map(map: &Mutex<EntryMap>, now: Instant, retention: Duration) -> usize {
    let mut map = map.lock().unwrap_or_else(|e| e.into_inner());
    let before = map.len();
    map.retain(|_, entry| now.saturating_duration_since(entry.added_at) <= retention);
    before - map.len()
}
