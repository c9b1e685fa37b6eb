//! Error types for the dependency cache

use std::path::PathBuf;

use core_types::FailureKind;
use thiserror::Error;

/// Errors raised while reading the cache or fetching from the network
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// Cache storage could not be read or written
    #[error("cache IO error at {}: {message}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error text
        message: String,
    },

    /// The request never produced a response
    #[error("Failed to fetch {url}: {message}")]
    Network {
        /// Requested URL
        url: String,
        /// Transport error text
        message: String,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// User-facing failure classification
    pub fn kind(&self) -> FailureKind {
        FailureKind::BundleFetchError
    }
}

/// Result alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
