//! Benchmark run lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one task or run.
///
/// `Idle` is initial; `Completed`, `Failed` and `Cancelled` are terminal.
///
/// ```
/// use core_types::RunStatus;
///
/// assert!(RunStatus::Idle.can_transition_to(RunStatus::Running));
/// assert!(!RunStatus::Completed.can_transition_to(RunStatus::Running));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Created, not started
    #[default]
    Idle,
    /// Running discarded warmup iterations
    Warmup,
    /// Measuring
    Running,
    /// Finished with a result
    Completed,
    /// Finished with an error
    Failed,
    /// Stopped from outside
    Cancelled,
}

impl RunStatus {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Warmup => "warmup",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    /// Warmup or running
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Warmup | RunStatus::Running)
    }

    /// Legal edges of `idle -> warmup? -> running -> terminal`.
    ///
    /// Any non-terminal state may fail or be cancelled.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        use RunStatus::*;
        match (self, next) {
            (Idle, Warmup) | (Idle, Running) | (Warmup, Running) | (Running, Completed) => true,
            (from, Failed) | (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [RunStatus::Completed, RunStatus::Failed, RunStatus::Cancelled] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(RunStatus::Cancelled));
            assert!(!terminal.can_transition_to(RunStatus::Running));
        }
    }

    #[test]
    fn test_warmup_is_optional() {
        assert!(RunStatus::Idle.can_transition_to(RunStatus::Warmup));
        assert!(RunStatus::Idle.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Running.can_transition_to(RunStatus::Warmup));
        assert!(!RunStatus::Idle.can_transition_to(RunStatus::Completed));
        assert!(RunStatus::Idle.can_transition_to(RunStatus::Failed));
    }

    #[test]
    fn test_serialized_names_are_lowercase() {
        assert_eq!(serde_json::to_value(RunStatus::Warmup).unwrap(), "warmup");
    }
}
