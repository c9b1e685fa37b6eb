//! Persistent dependency cache
//!
//! Module sources fetched over the network are stored by URL and served
//! locally on every later request. Entries never expire; [`CachedFetch::clear`]
//! and [`CachedFetch::count`] are the only maintenance operations.
//!
//! # Overview
//!
//! - [`CacheStore`] - Key/value storage keyed by full URL ([`DiskCache`], [`MemoryCache`])
//! - [`Fetcher`] - Network access ([`HttpFetcher`], [`StaticFetcher`])
//! - [`CachedFetch`] - The cached fetch function shared by the bundler
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dependency_cache::{CachedFetch, MemoryCache, StaticFetcher};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fetcher = StaticFetcher::new().with("https://esm.sh/a", "export const a = 1;");
//! let cache = CachedFetch::new(Arc::new(MemoryCache::new()), Arc::new(fetcher));
//!
//! let first = cache.fetch("https://esm.sh/a").await.unwrap();
//! let second = cache.fetch("https://esm.sh/a").await.unwrap();
//! assert!(!first.from_cache);
//! assert!(second.from_cache);
//! assert_eq!(cache.count().unwrap(), 1);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cached;
mod error;
mod fetcher;
mod store;

pub use cached::{CacheStats, CachedFetch};
pub use error::{CacheError, Result};
pub use fetcher::{FetchResponse, Fetcher, HttpFetcher, StaticFetcher};
pub use store::{default_cache_dir, CacheStore, DiskCache, MemoryCache};
