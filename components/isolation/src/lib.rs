//! Execution Isolation Layer
//!
//! Hosts the benchmark runner on a dedicated worker thread with its own JS
//! engine. The host talks to it only through [`HostMessage`]s and
//! [`WorkerMessage`]s, and may terminate it at any time.
//!
//! # Example
//!
//! ```
//! use core_types::{BenchmarkOptions, Count};
//! use isolation::{HostMessage, RunRequest, Worker, WorkerConfig, WorkerMessage};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut worker = Worker::spawn(WorkerConfig::default()).unwrap();
//! let options = BenchmarkOptions { iterations: Count::Fixed(10), ..Default::default() };
//! worker
//!     .send(HostMessage::Start {
//!         runs: vec![RunRequest::new("r1", "return () => 1;")],
//!         options,
//!     })
//!     .unwrap();
//!
//! while let Some(message) = worker.recv().await {
//!     if let WorkerMessage::Result { result, .. } = message {
//!         assert_eq!(result.samples, 10);
//!         break;
//!     }
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod console;
mod error;
mod messages;
mod worker;

pub use config::{WorkerConfig, DEFAULT_FLUSH_INTERVAL};
pub use console::{ConsoleBuffer, MAX_BUFFERED_ENTRIES};
pub use error::{IsolationError, Result};
pub use messages::{HostMessage, RunRequest, WorkerMessage};
pub use worker::{Worker, WorkerHandle};
