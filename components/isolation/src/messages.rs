//! The host/worker message protocol
//!
//! Both directions serialize as JSON objects tagged by `type`, with
//! camelCase field names.

use core_types::{BenchmarkOptions, BenchmarkResult, ConsoleLog, FailureKind};
use serde::{Deserialize, Serialize};

/// One run to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Run id echoed in every message about it
    pub run_id: String,
    /// Bundled function body returning `run`
    pub processed_code: String,
}

impl RunRequest {
    /// Create a request
    pub fn new(run_id: impl Into<String>, processed_code: impl Into<String>) -> Self {
        RunRequest {
            run_id: run_id.into(),
            processed_code: processed_code.into(),
        }
    }
}

/// Host to worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Measure `runs` sequentially with `options`
    Start {
        /// Runs in execution order
        runs: Vec<RunRequest>,
        /// Measurement options
        options: BenchmarkOptions,
    },
}

/// Worker to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// Diagnostic: the run is about to be prepared
    #[serde(rename_all = "camelCase")]
    TaskStart {
        /// Run id
        run_id: String,
    },
    /// Diagnostic: the code is being evaluated
    #[serde(rename_all = "camelCase")]
    Setup {
        /// Run id
        run_id: String,
    },
    /// Warmup began
    #[serde(rename_all = "camelCase")]
    WarmupStart {
        /// Run id
        run_id: String,
    },
    /// Warmup ended
    #[serde(rename_all = "camelCase")]
    WarmupEnd {
        /// Run id
        run_id: String,
    },
    /// Measurement progress
    #[serde(rename_all = "camelCase")]
    Progress {
        /// Run id
        run_id: String,
        /// Percentage, below 100
        progress: f64,
        /// Milliseconds spent measuring
        elapsed_time: f64,
        /// Calls measured so far
        iterations_completed: u64,
        /// Expected calls
        total_iterations: u64,
    },
    /// Diagnostic: the run's context is being dropped
    #[serde(rename_all = "camelCase")]
    Teardown {
        /// Run id
        run_id: String,
    },
    /// Diagnostic: the run finished measuring
    #[serde(rename_all = "camelCase")]
    TaskComplete {
        /// Run id
        run_id: String,
    },
    /// Final statistics, always the last message for the run
    #[serde(rename_all = "camelCase")]
    Result {
        /// Run id
        run_id: String,
        /// Statistics
        result: BenchmarkResult,
    },
    /// Failure, always the last message for the run
    #[serde(rename_all = "camelCase")]
    Error {
        /// Run id
        run_id: String,
        /// Printable error message
        error: String,
        /// Failure classification
        kind: FailureKind,
    },
    /// Captured console output
    #[serde(rename_all = "camelCase")]
    ConsoleBatch {
        /// Run id
        run_id: String,
        /// Coalesced entries in logging order
        logs: Vec<ConsoleLog>,
    },
}

impl WorkerMessage {
    /// Id of the run the message is about
    pub fn run_id(&self) -> &str {
        match self {
            WorkerMessage::TaskStart { run_id }
            | WorkerMessage::Setup { run_id }
            | WorkerMessage::WarmupStart { run_id }
            | WorkerMessage::WarmupEnd { run_id }
            | WorkerMessage::Progress { run_id, .. }
            | WorkerMessage::Teardown { run_id }
            | WorkerMessage::TaskComplete { run_id }
            | WorkerMessage::Result { run_id, .. }
            | WorkerMessage::Error { run_id, .. }
            | WorkerMessage::ConsoleBatch { run_id, .. } => run_id,
        }
    }

    /// `result` or `error`
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerMessage::Result { .. } | WorkerMessage::Error { .. })
    }

    /// `type` tag of the message
    pub fn name(&self) -> &'static str {
        match self {
            WorkerMessage::TaskStart { .. } => "taskStart",
            WorkerMessage::Setup { .. } => "setup",
            WorkerMessage::WarmupStart { .. } => "warmupStart",
            WorkerMessage::WarmupEnd { .. } => "warmupEnd",
            WorkerMessage::Progress { .. } => "progress",
            WorkerMessage::Teardown { .. } => "teardown",
            WorkerMessage::TaskComplete { .. } => "taskComplete",
            WorkerMessage::Result { .. } => "result",
            WorkerMessage::Error { .. } => "error",
            WorkerMessage::ConsoleBatch { .. } => "consoleBatch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::ConsoleLevel;
    use serde_json::json;

    #[test]
    fn test_start_message_json() {
        let message: HostMessage = serde_json::from_value(json!({
            "type": "start",
            "runs": [{"runId": "a", "processedCode": "return () => 1;"}],
            "options": {"iterations": 5}
        }))
        .unwrap();
        let HostMessage::Start { runs, options } = message;
        assert_eq!(runs, vec![RunRequest::new("a", "return () => 1;")]);
        assert_eq!(options.iterations, core_types::Count::Fixed(5));
    }

    #[test]
    fn test_worker_message_json_uses_camel_case() {
        let message = WorkerMessage::ConsoleBatch {
            run_id: "a".to_string(),
            logs: vec![ConsoleLog {
                level: ConsoleLevel::Warn,
                message: "careful".to_string(),
                count: 2,
            }],
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "consoleBatch");
        assert_eq!(value["runId"], "a");
        assert_eq!(value["logs"][0]["count"], 2);
        assert_eq!(message.name(), "consoleBatch");

        let progress = WorkerMessage::Progress {
            run_id: "a".to_string(),
            progress: 10.0,
            elapsed_time: 3.0,
            iterations_completed: 1,
            total_iterations: 10,
        };
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["totalIterations"], 10);
        assert!(!progress.is_terminal());
    }
}
