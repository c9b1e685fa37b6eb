//! Orchestrator errors

use core_types::{FailureKind, RunStatus};
use isolation::IsolationError;
use thiserror::Error;

/// Why a batch did not produce results
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrchestratorError {
    /// At least one implementation failed to transform or bundle
    #[error("{failed} of {total} implementations failed to build: {message}")]
    Preprocessing {
        /// Failed implementations
        failed: usize,
        /// Implementations in the batch
        total: usize,
        /// Message of the first failure
        message: String,
        /// Classification of the first failure
        kind: FailureKind,
    },

    /// A run threw while being measured
    #[error("run {run_id} failed: {message}")]
    Execution {
        /// Failing run
        run_id: String,
        /// Thrown message
        message: String,
    },

    /// The batch was stopped or superseded
    #[error("benchmark was cancelled")]
    Cancelled,

    /// The worker exited without reporting every run
    #[error("worker exited before every run finished")]
    WorkerLost,

    /// Worker could not be started or reached
    #[error(transparent)]
    Isolation(#[from] IsolationError),

    /// Results could not be serialized
    #[error("failed to serialize results: {0}")]
    Export(String),
}

impl OrchestratorError {
    /// User-facing failure classification
    pub fn kind(&self) -> FailureKind {
        match self {
            OrchestratorError::Preprocessing { kind, .. } => *kind,
            OrchestratorError::Cancelled => FailureKind::Cancelled,
            OrchestratorError::Isolation(err) => err.kind(),
            OrchestratorError::Execution { .. }
            | OrchestratorError::WorkerLost
            | OrchestratorError::Export(_) => FailureKind::ExecutionError,
        }
    }
}

/// A rejected run mutation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("run {run_id} cannot go from {from} to {to}")]
pub struct TransitionError {
    /// Run id
    pub run_id: String,
    /// Current status
    pub from: RunStatus,
    /// Requested status
    pub to: RunStatus,
}

/// Result alias for the orchestrator
pub type Result<T> = std::result::Result<T, OrchestratorError>;
