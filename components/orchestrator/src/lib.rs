//! Run Orchestrator
//!
//! The entry point a front end talks to. [`BenchmarkService`] takes a setup
//! module and a list of implementations through transform, bundle and an
//! isolated worker, and keeps one [`BenchmarkRun`] per implementation up to
//! date in a [`BenchmarkStore`] that observers can subscribe to.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use code_processor::CachedLoader;
//! use core_types::{BenchmarkOptions, Implementation};
//! use dependency_cache::{CachedFetch, DiskCache, HttpFetcher};
//! use orchestrator::{BenchmarkService, BenchmarkStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetch = CachedFetch::new(
//!     Arc::new(DiskCache::open("/tmp/jsbench")?),
//!     Arc::new(HttpFetcher::new(std::time::Duration::from_secs(30))?),
//! );
//! let service = BenchmarkService::new(
//!     Arc::new(BenchmarkStore::new()),
//!     Arc::new(CachedLoader::new(Arc::new(fetch))),
//! );
//!
//! let implementations = [Implementation::new("1", "sum.ts", "export const run = () => 1 + 1;")];
//! let results = service
//!     .run_benchmark("", &implementations, BenchmarkOptions::default())
//!     .await?;
//! println!("{:.0} ops/s", results[0].ops_per_second.average);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod export;
mod format;
mod run;
mod service;
mod store;

pub use error::{OrchestratorError, Result, TransitionError};
pub use export::{export_results, export_results_json, ExportedResult};
pub use format::{format_count, format_count_short, format_margin, format_ops, format_time};
pub use run::{BenchmarkRun, ChartDataPoint, ConsoleLogEntry, SIBLING_FAILURE_MESSAGE};
pub use service::BenchmarkService;
pub use store::{BenchmarkStore, StoreEvent};
