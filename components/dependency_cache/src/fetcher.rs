//! Network access behind a trait, so tests never touch the network

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CacheError, Result};

/// A fetched response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final URL that was requested
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
    /// Served from the local cache
    pub from_cache: bool,
}

impl FetchResponse {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can fetch a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`. Non-2xx statuses are returned, not raised.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

/// `reqwest`-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jsbench/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CacheError::Network {
                url: String::new(),
                message: err.to_string(),
            })?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let network = |err: reqwest::Error| CacheError::Network {
            url: url.to_string(),
            message: err.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(network)?;
        debug!(url, status, bytes = body.len(), "fetched");
        Ok(FetchResponse {
            url: final_url,
            status,
            body,
            from_cache: false,
        })
    }
}

/// Fetcher serving fixed responses from memory.
///
/// Unknown URLs answer 404. Every call is counted.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, (u16, String)>,
    requests: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticFetcher {
    /// Empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `url`
    pub fn with(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_status(url, 200, body)
    }

    /// Serve `body` with `status` for `url`
    pub fn with_status(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), (status, body.into()));
        self
    }

    /// Sleep before answering, to widen races in tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches served so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let (status, body) = self
            .responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| (404, "Not Found".to_string()));
        Ok(FetchResponse {
            url: url.to_string(),
            status,
            body,
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher_unknown_url_is_404() {
        let fetcher = StaticFetcher::new().with("https://a", "x");
        let hit = fetcher.fetch("https://a").await.unwrap();
        let miss = fetcher.fetch("https://b").await.unwrap();
        assert!(hit.is_success());
        assert_eq!(miss.status, 404);
        assert!(!miss.is_success());
        assert_eq!(fetcher.requests(), 2);
    }
}
