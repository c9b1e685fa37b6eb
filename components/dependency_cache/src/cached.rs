//! The cached fetch function

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetcher::{FetchResponse, Fetcher};
use crate::store::CacheStore;

type InFlight = Arc<OnceCell<Result<FetchResponse>>>;

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from the store
    pub hits: u64,
    /// Requests that went to the network
    pub misses: u64,
}

/// Fetch through a persistent store.
///
/// A URL that was fetched successfully once is never requested again.
/// Concurrent misses for the same URL share one request.
pub struct CachedFetch {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedFetch {
    /// Combine a store and a fetcher
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        CachedFetch {
            store,
            fetcher,
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fetch `url`, serving it from the store when possible.
    ///
    /// Only 2xx bodies are stored; other statuses are returned to the caller
    /// and requested again next time.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        if let Some(body) = self.store.get(url)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(url, "dependency cache hit");
            return Ok(FetchResponse {
                url: url.to_string(),
                status: 200,
                body,
                from_cache: true,
            });
        }

        let cell = self
            .in_flight
            .lock()
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let response = cell
            .get_or_init(|| async {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(url, "dependency cache miss");
                let response = self.fetcher.fetch(url).await?;
                if response.is_success() {
                    if let Err(err) = self.store.set(url, &response.body) {
                        warn!(url, error = %err, "failed to store dependency");
                    }
                }
                Ok(response)
            })
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock();
            if in_flight.get(url).map_or(false, |current| Arc::ptr_eq(current, &cell)) {
                in_flight.remove(url);
            }
        }

        response
    }

    /// Remove every cached entry
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    /// Number of cached entries
    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    /// Hit/miss counters since creation
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StaticFetcher;
    use crate::store::MemoryCache;
    use std::time::Duration;

    fn cached(fetcher: StaticFetcher) -> (CachedFetch, Arc<StaticFetcher>) {
        let fetcher = Arc::new(fetcher);
        let cache = CachedFetch::new(Arc::new(MemoryCache::new()), fetcher.clone());
        (cache, fetcher)
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_store() {
        let (cache, fetcher) = cached(StaticFetcher::new().with("https://esm.sh/a", "a"));
        cache.fetch("https://esm.sh/a").await.unwrap();
        let second = cache.fetch("https://esm.sh/a").await.unwrap();

        assert!(second.from_cache);
        assert_eq!(second.body, "a");
        assert_eq!(fetcher.requests(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn test_error_statuses_are_not_cached() {
        let (cache, fetcher) =
            cached(StaticFetcher::new().with_status("https://esm.sh/x", 500, "boom"));
        let first = cache.fetch("https://esm.sh/x").await.unwrap();
        assert_eq!(first.status, 500);
        cache.fetch("https://esm.sh/x").await.unwrap();

        assert_eq!(fetcher.requests(), 2);
        assert_eq!(cache.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_request() {
        let (cache, fetcher) = cached(
            StaticFetcher::new()
                .with("https://esm.sh/slow", "slow")
                .with_delay(Duration::from_millis(50)),
        );
        let (a, b) = tokio::join!(
            cache.fetch("https://esm.sh/slow"),
            cache.fetch("https://esm.sh/slow")
        );

        assert_eq!(a.unwrap().body, "slow");
        assert_eq!(b.unwrap().body, "slow");
        assert_eq!(fetcher.requests(), 1);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let (cache, fetcher) = cached(StaticFetcher::new().with("https://esm.sh/a", "a"));
        cache.fetch("https://esm.sh/a").await.unwrap();
        cache.clear().unwrap();
        cache.fetch("https://esm.sh/a").await.unwrap();
        assert_eq!(fetcher.requests(), 2);
    }
}
