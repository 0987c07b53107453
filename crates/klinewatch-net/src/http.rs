//! `reqwest`-backed [`Fetch`] implementation

use std::time::Duration;

use reqwest::Client;
use url::Url;

use klinewatch_core::prelude::*;

use crate::transport::{Fetch, FetchFailure, FetchResult};

/// Longest error-body excerpt carried into a failure message
const MAX_BODY_EXCERPT: usize = 256;

/// HTTP GET fetcher used in production
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn get(&self, url: Url) -> FetchResult {
        let shown = redact(&url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                FetchFailure::no_response(format!("URL: {}: {}", shown, e.without_url()))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            FetchFailure::new(
                status.as_u16(),
                format!("URL: {}: {}", shown, e.without_url()),
            )
        })?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let excerpt: String = text.chars().take(MAX_BODY_EXCERPT).collect();
            return Err(FetchFailure::new(
                status.as_u16(),
                format!("Error code: {} URL: {} Data: {}", status.as_u16(), shown, excerpt),
            ));
        }

        Ok(body.to_vec())
    }
}

/// Render `url` for logs with the password parameter masked
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "password") {
        return url.to_string();
    }

    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "password" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    shown.set_query(None);
    shown.query_pairs_mut().extend_pairs(pairs);
    shown.to_string()
}
