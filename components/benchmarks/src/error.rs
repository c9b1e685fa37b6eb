//! Runner errors

use core_types::FailureKind;
use thiserror::Error;

/// Why a task did not produce a result
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunnerError {
    /// The JS runtime or context could not be created
    #[error("JavaScript engine error: {0}")]
    Engine(String),

    /// The compiled code threw, or `run` did
    #[error("{message}")]
    Execution {
        /// Printable form of the thrown value
        message: String,
    },

    /// The runner was interrupted from outside
    #[error("Benchmark was cancelled")]
    Cancelled,
}

impl RunnerError {
    /// Execution failure with `message`
    pub fn execution(message: impl Into<String>) -> Self {
        RunnerError::Execution {
            message: message.into(),
        }
    }

    /// User-facing failure classification
    pub fn kind(&self) -> FailureKind {
        match self {
            RunnerError::Engine(_) | RunnerError::Execution { .. } => FailureKind::ExecutionError,
            RunnerError::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Result alias for the runner
pub type Result<T> = std::result::Result<T, RunnerError>;
