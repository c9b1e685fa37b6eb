//! Isolation errors

use core_types::FailureKind;
use thiserror::Error;

/// Failures talking to a worker
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IsolationError {
    /// The worker thread could not be started
    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    /// The worker is gone
    #[error("worker {0} has terminated")]
    Terminated(u64),
}

impl IsolationError {
    /// User-facing failure classification
    pub fn kind(&self) -> FailureKind {
        match self {
            IsolationError::Spawn(_) => FailureKind::ExecutionError,
            IsolationError::Terminated(_) => FailureKind::Cancelled,
        }
    }
}

/// Result alias for the isolation layer
pub type Result<T> = std::result::Result<T, IsolationError>;
