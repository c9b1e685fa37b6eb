//! Shared data model and error types for the benchmark pipeline.
//!
//! This crate provides the foundational types every other component depends
//! on: the units of user code being measured, the options that drive a
//! measurement, the statistics it produces, and the error taxonomy used to
//! report failures back to the user.
//!
//! # Overview
//!
//! - [`Implementation`] / [`Library`] - User code and permitted external packages
//! - [`BenchmarkOptions`] - Measurement configuration (`"auto"` or explicit values)
//! - [`BenchmarkResult`] - Immutable statistics snapshot of a completed run
//! - [`ConsoleLevel`] / [`ConsoleLog`] - Captured user console output
//! - [`JsError`] / [`ErrorKind`] - Parse-time errors with source positions
//! - [`FailureKind`] - User-facing failure taxonomy
//! - [`RunStatus`] - Run lifecycle states
//!
//! # Examples
//!
//! ```
//! use core_types::{BenchmarkOptions, Count, Library};
//!
//! let options: BenchmarkOptions = serde_json::from_str(r#"{"iterations": 500}"#).unwrap();
//! assert_eq!(options.iterations, Count::Fixed(500));
//! assert_eq!(options.time, 1000);
//!
//! let lodash = Library::new("lodash");
//! assert_eq!(lodash.resolved_url(), "https://esm.sh/lodash");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod console;
mod error;
mod model;
mod options;
mod result;
mod source;
mod status;

pub use console::{ConsoleLevel, ConsoleLog};
pub use error::{ErrorKind, FailureKind, JsError};
pub use model::{Implementation, Library, CDN_BASE_URL};
pub use options::{BatchingOptions, BenchmarkOptions, Count, TimingMethod, WarmupOptions};
pub use result::{BenchmarkResult, OpsStats, TimeStats};
pub use source::SourcePosition;
pub use status::RunStatus;
