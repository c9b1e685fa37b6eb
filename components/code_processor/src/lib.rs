//! Benchmark source processing
//!
//! Turns a setup module plus one implementation module into a single
//! function body that returns the `run` function:
//!
//! 1. [`transform`] parses the combined source, rewrites library imports,
//!    normalizes the `run` export and strips every other export.
//! 2. [`bundle`] inlines every network import into a module registry placed
//!    in front of the entry statements.
//!
//! # Example
//!
//! ```
//! use code_processor::{combine_sources, transform};
//!
//! let source = combine_sources("export const base = 40;", "export const run = () => base + 2;");
//! let code = transform(&source, &[]).unwrap();
//! assert_eq!(code, "const base = 40;\nreturn function run() {\n  return base + 2;\n};\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundler;
mod error;
pub mod transform;

pub use bundler::{bundle, CachedLoader, ModuleLoader};
pub use error::{ProcessError, Result};
pub use transform::{combine_sources, transform};

use std::sync::Arc;

use core_types::Library;
use tracing::debug;

/// Transform then bundle one implementation
pub async fn process_implementation(
    setup: &str,
    implementation: &str,
    libraries: &[Library],
    loader: Arc<dyn ModuleLoader>,
) -> Result<String> {
    let transformed = transform(&combine_sources(setup, implementation), libraries)?;
    debug!(bytes = transformed.len(), "transformed implementation");
    bundle(&transformed, libraries, loader).await
}
