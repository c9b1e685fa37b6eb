//! Runner lifecycle events

use core_types::{BenchmarkResult, FailureKind};
use serde::Serialize;

/// Progress of one task's measurement phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Percentage, non-decreasing and below 100 while running
    pub progress: f64,
    /// Measured calls so far
    pub iterations_completed: u64,
    /// Expected calls (an estimate for time-budgeted runs)
    pub iterations_total: u64,
    /// Measurement time so far, in milliseconds
    pub elapsed_time: f64,
}

/// Events emitted while running tasks, tagged with the task id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunnerEvent {
    /// A task is about to be prepared
    TaskStart {
        /// Task id
        id: String,
    },
    /// The compiled factory is being evaluated
    Setup {
        /// Task id
        id: String,
    },
    /// Warmup iterations began
    WarmupStart {
        /// Task id
        id: String,
    },
    /// Warmup iterations ended
    WarmupEnd {
        /// Task id
        id: String,
    },
    /// After a measured batch
    Progress {
        /// Task id
        id: String,
        /// Current progress
        #[serde(flatten)]
        progress: Progress,
    },
    /// The task's context is being torn down
    Teardown {
        /// Task id
        id: String,
    },
    /// Final statistics
    TaskComplete {
        /// Task id
        id: String,
        /// Measured statistics
        result: BenchmarkResult,
    },
    /// The task failed instead of completing
    Error {
        /// Task id
        id: String,
        /// Printable error message
        message: String,
        /// Failure classification
        kind: FailureKind,
    },
}

impl RunnerEvent {
    /// Id of the task the event belongs to
    pub fn id(&self) -> &str {
        match self {
            RunnerEvent::TaskStart { id }
            | RunnerEvent::Setup { id }
            | RunnerEvent::WarmupStart { id }
            | RunnerEvent::WarmupEnd { id }
            | RunnerEvent::Progress { id, .. }
            | RunnerEvent::Teardown { id }
            | RunnerEvent::TaskComplete { id, .. }
            | RunnerEvent::Error { id, .. } => id,
        }
    }
}

/// Receiver of runner events
pub trait EventSink {
    /// Handle one event
    fn emit(&mut self, event: RunnerEvent);
}

impl<F: FnMut(RunnerEvent)> EventSink for F {
    fn emit(&mut self, event: RunnerEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_json_is_flat() {
        let event = RunnerEvent::Progress {
            id: "a".to_string(),
            progress: Progress {
                progress: 50.0,
                iterations_completed: 5,
                iterations_total: 10,
                elapsed_time: 1.5,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["iterationsCompleted"], 5);
        assert_eq!(json["elapsedTime"], 1.5);
        assert_eq!(event.id(), "a");
    }
}
