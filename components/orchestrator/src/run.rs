//! Run records
//!
//! A [`BenchmarkRun`] only changes through the transition methods below.
//! Once a run is terminal every mutation is rejected, which is what keeps
//! stale worker messages from touching a cancelled run.

use core_types::{BenchmarkResult, ConsoleLevel, ConsoleLog, FailureKind, Implementation, RunStatus};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Error text given to runs that were fine but whose batch failed to build
pub const SIBLING_FAILURE_MESSAGE: &str = "Cancelled due to errors in other implementations";

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One timed execution attempt of one implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRun {
    /// Run id
    pub id: String,
    /// Implementation the run measures
    pub implementation_id: String,
    /// Creation time, unix milliseconds
    pub created_at: i64,
    /// When warmup began, unix milliseconds
    pub warmup_started_at: Option<i64>,
    /// When warmup ended, unix milliseconds
    pub warmup_ended_at: Option<i64>,
    /// Lifecycle state
    pub status: RunStatus,
    /// Implementation file name
    pub filename: String,
    /// Source snapshot taken at creation
    pub original_code: String,
    /// Bundled code sent to the worker
    pub processed_code: String,
    /// Percentage, 100 once completed
    pub progress: f64,
    /// Milliseconds spent measuring
    pub elapsed_time: f64,
    /// Calls measured so far
    pub completed_iterations: u64,
    /// Expected calls
    pub total_iterations: u64,
    /// Set exactly when failed
    pub error: Option<String>,
    /// Classification of `error`
    pub error_kind: Option<FailureKind>,
    /// Set exactly when completed
    pub result: Option<BenchmarkResult>,
}

impl BenchmarkRun {
    /// Fresh idle run over a snapshot of `implementation`
    pub fn new(implementation: &Implementation) -> Self {
        BenchmarkRun {
            id: nanoid::nanoid!(),
            implementation_id: implementation.id.clone(),
            created_at: now_ms(),
            warmup_started_at: None,
            warmup_ended_at: None,
            status: RunStatus::Idle,
            filename: implementation.filename.clone(),
            original_code: implementation.content.clone(),
            processed_code: String::new(),
            progress: 0.0,
            elapsed_time: 0.0,
            completed_iterations: 0,
            total_iterations: 0,
            error: None,
            error_kind: None,
            result: None,
        }
    }

    fn transition(&mut self, to: RunStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                run_id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    fn ensure_live(&self, to: RunStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                run_id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    /// Record the bundled code
    pub fn set_processed_code(&mut self, code: String) -> Result<(), TransitionError> {
        self.ensure_live(self.status)?;
        self.processed_code = code;
        Ok(())
    }

    /// Warmup began
    pub fn begin_warmup(&mut self) -> Result<(), TransitionError> {
        self.transition(RunStatus::Warmup)?;
        self.warmup_started_at = Some(now_ms());
        Ok(())
    }

    /// Warmup ended, measurement begins
    pub fn end_warmup(&mut self) -> Result<(), TransitionError> {
        self.transition(RunStatus::Running)?;
        self.warmup_ended_at = Some(now_ms());
        Ok(())
    }

    /// Measurement progress. `progress` never moves backwards.
    pub fn record_progress(
        &mut self,
        progress: f64,
        elapsed_time: f64,
        completed_iterations: u64,
        total_iterations: u64,
    ) -> Result<(), TransitionError> {
        if self.status != RunStatus::Running {
            self.transition(RunStatus::Running)?;
        }
        self.progress = self.progress.max(progress.min(100.0));
        self.elapsed_time = elapsed_time;
        self.completed_iterations = self.completed_iterations.max(completed_iterations);
        self.total_iterations = total_iterations;
        Ok(())
    }

    /// Finished with statistics
    pub fn complete(&mut self, result: BenchmarkResult) -> Result<(), TransitionError> {
        if matches!(self.status, RunStatus::Idle | RunStatus::Warmup) {
            self.transition(RunStatus::Running)?;
        }
        self.transition(RunStatus::Completed)?;
        self.progress = 100.0;
        self.elapsed_time = result.time.total;
        self.completed_iterations = result.samples;
        self.total_iterations = result.samples;
        self.result = Some(result);
        Ok(())
    }

    /// Finished with an error
    pub fn fail(&mut self, message: impl Into<String>, kind: FailureKind) -> Result<(), TransitionError> {
        self.transition(RunStatus::Failed)?;
        self.error = Some(message.into());
        self.error_kind = Some(kind);
        Ok(())
    }

    /// Stopped from outside
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.transition(RunStatus::Cancelled)
    }
}

/// Captured console output attributed to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleLogEntry {
    /// Console method
    pub level: ConsoleLevel,
    /// Formatted message
    pub message: String,
    /// When the entry was first received, unix milliseconds
    pub timestamp: i64,
    /// Consecutive repeats
    pub count: u32,
}

impl ConsoleLogEntry {
    pub(crate) fn from_log(log: ConsoleLog) -> Self {
        ConsoleLogEntry {
            level: log.level,
            message: log.message,
            timestamp: now_ms(),
            count: log.count,
        }
    }
}

/// One point of a run's live chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    /// Elapsed measurement time, ms
    pub time: f64,
    /// Average time per call so far, ms
    pub time_per_op: f64,
    /// Calls measured so far
    pub iterations: u64,
}

impl ChartDataPoint {
    pub(crate) fn new(time: f64, iterations: u64) -> Self {
        let time_per_op = if iterations == 0 {
            0.0
        } else {
            time / iterations as f64
        };
        ChartDataPoint {
            time,
            time_per_op,
            iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> BenchmarkRun {
        BenchmarkRun::new(&Implementation::new("impl-1", "a.ts", "export const run = () => 1;"))
    }

    fn result() -> BenchmarkResult {
        let mut result = BenchmarkResult {
            samples: 10,
            batches: 10,
            ..BenchmarkResult::default()
        };
        result.time.total = 4.0;
        result
    }

    #[test]
    fn test_new_run_snapshots_the_implementation() {
        let run = run();
        assert_eq!(run.status, RunStatus::Idle);
        assert_eq!(run.implementation_id, "impl-1");
        assert_eq!(run.filename, "a.ts");
        assert_eq!(run.id.len(), 21);
        assert!(run.result.is_none() && run.error.is_none());
    }

    #[test]
    fn test_progress_never_moves_backwards() {
        let mut run = run();
        run.record_progress(40.0, 4.0, 40, 100).unwrap();
        run.record_progress(30.0, 5.0, 30, 100).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.progress, 40.0);
        assert_eq!(run.completed_iterations, 40);
    }

    #[test]
    fn test_result_exactly_when_completed() {
        let mut run = run();
        run.begin_warmup().unwrap();
        run.complete(result()).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.progress, 100.0);
        assert_eq!(run.elapsed_time, 4.0);
        assert!(run.result.is_some());
        assert!(run.error.is_none());
    }

    #[test]
    fn test_terminal_runs_reject_mutation() {
        let mut run = run();
        run.cancel().unwrap();
        assert!(run.record_progress(50.0, 1.0, 5, 10).is_err());
        assert!(run.complete(result()).is_err());
        assert!(run.fail("late", FailureKind::ExecutionError).is_err());
        assert!(run.set_processed_code("x".to_string()).is_err());
        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(run.progress, 0.0);
        assert!(run.error.is_none());
    }

    #[test]
    fn test_warmup_cannot_restart_after_measuring() {
        let mut run = run();
        run.record_progress(10.0, 1.0, 1, 10).unwrap();
        let err = run.begin_warmup().unwrap_err();
        assert_eq!(err.from, RunStatus::Running);
        assert_eq!(err.to, RunStatus::Warmup);
    }

    #[test]
    fn test_chart_point_time_per_op() {
        assert_eq!(ChartDataPoint::new(10.0, 4).time_per_op, 2.5);
        assert_eq!(ChartDataPoint::new(10.0, 0).time_per_op, 0.0);
    }

    #[test]
    fn test_run_json_is_camel_case() {
        let json = serde_json::to_value(run()).unwrap();
        assert_eq!(json["status"], "idle");
        assert!(json.get("implementationId").is_some());
        assert!(json.get("warmupStartedAt").is_some());
    }
}
