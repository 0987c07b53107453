//! Fire-and-forget transport with identifiable outcomes
//!
//! [`Transport::send`] allocates a [`RequestId`], starts the GET on a tokio
//! task and returns immediately. When the call completes, its outcome is
//! parked in the shared [`ResultStore`] under that id. The engine later asks
//! for it with [`Transport::poll_once`] from its tick.

use std::sync::Arc;

use url::Url;

use klinewatch_core::prelude::*;

use crate::query::{next_request_id, Query, RequestId};
use crate::results::{Outcome, ResultStore};

/// Failure of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// HTTP status, or 0 when no response was received
    pub status: u16,
    pub message: String,
}

impl FetchFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Connection-level failure without any HTTP response
    pub fn no_response(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

pub type FetchResult = std::result::Result<Vec<u8>, FetchFailure>;

/// Network primitive: one GET, resolving to the body or a failure
#[trait_variant::make(Fetch: Send)]
pub trait LocalFetch {
    async fn get(&self, url: Url) -> FetchResult;
}

/// Sends queries and parks their outcomes in the result store
pub struct Transport<F> {
    fetcher: Arc<F>,
    base_url: Url,
    store: Arc<ResultStore>,
}

impl<F> std::fmt::Debug for Transport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("parked", &self.store.len())
            .finish()
    }
}

impl<F> Transport<F>
where
    F: Fetch + Sync + 'static,
{
    pub fn new(fetcher: F, base_url: Url, store: Arc<ResultStore>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            base_url,
            store,
        }
    }

    /// Start sending `query`; returns the id its outcome will be parked under.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send(&self, query: &Query) -> RequestId {
        let id = next_request_id();
        let url = query.to_url(&self.base_url);
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);

        debug!("Sending request #{}: {}", id, query.description());

        tokio::spawn(async move {
            let outcome = match fetcher.get(url).await {
                Ok(body) => {
                    trace!("Request #{} answered with {} byte(s)", id, body.len());
                    Outcome::success(body)
                }
                Err(failure) => {
                    debug!(
                        "Request #{} failed: code={} {}",
                        id, failure.status, failure.message
                    );
                    Outcome::failure(failure.status, failure.message)
                }
            };
            store.deposit(id, outcome);
        });

        id
    }

    /// Take the outcome for `id` if it has arrived
    pub fn poll_once(&self, id: RequestId) -> Option<Outcome> {
        self.store.take(id)
    }

    /// Drop outcomes that outlived the retention window
    pub fn sweep(&self) -> usize {
        self.store.prune()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }
}
