//! Error types for source processing

use core_types::{FailureKind, JsError};
use thiserror::Error;

/// Errors raised while transforming or bundling benchmark code
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessError {
    /// The source is not valid JavaScript/TypeScript
    #[error("{0}")]
    Parse(JsError),

    /// A fetched module failed to parse
    #[error("{url}: {error}")]
    ModuleParse {
        /// Module URL
        url: String,
        /// Parse failure
        error: JsError,
    },

    /// No recognizable `run` export
    #[error("No `run` function export found. Export it as `export function run() {{}}`, `export const run = () => {{}}` or `export default () => {{}}`")]
    MissingExport,

    /// An import specifier could not be turned into a URL
    #[error("Could not resolve \"{specifier}\" from {importer}")]
    Unresolved {
        /// Import specifier as written
        specifier: String,
        /// Importing module, `<entry>` for the benchmark code itself
        importer: String,
    },

    /// A transitive import could not be fetched
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// Failing URL
        url: String,
        /// Status or transport error
        reason: String,
    },

    /// A fetched module awaits at the top level, which a factory cannot express
    #[error("Top-level await is not supported in bundled module {url}")]
    TopLevelAwait {
        /// Module URL
        url: String,
    },
}

impl ProcessError {
    /// User-facing failure classification
    pub fn kind(&self) -> FailureKind {
        match self {
            ProcessError::MissingExport => FailureKind::MissingExport,
            ProcessError::Fetch { .. } => FailureKind::BundleFetchError,
            ProcessError::Parse(_)
            | ProcessError::ModuleParse { .. }
            | ProcessError::Unresolved { .. }
            | ProcessError::TopLevelAwait { .. } => FailureKind::InvalidCode,
        }
    }
}

impl From<JsError> for ProcessError {
    fn from(err: JsError) -> Self {
        ProcessError::Parse(err)
    }
}

/// Result alias for source processing
pub type Result<T> = std::result::Result<T, ProcessError>;
