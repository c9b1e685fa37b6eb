//! Error types for the CLI

use std::path::PathBuf;

use code_processor::ProcessError;
use dependency_cache::CacheError;
use orchestrator::OrchestratorError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Invalid options file or flag
    #[error("invalid options: {0}")]
    Options(String),

    /// Transform or bundle failure
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Dependency cache failure
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Benchmark failure
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// JSON output failure
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
