//! Results export

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};
use crate::run::BenchmarkRun;

/// One entry of the exported results array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedResult {
    /// Implementation file name
    pub name: String,
    /// Total measured time, ms
    pub total_time: f64,
    /// Average operations per second
    pub ops_per_sec: f64,
}

/// Summaries of the completed runs among `runs`, in order
pub fn export_results(runs: &[BenchmarkRun]) -> Vec<ExportedResult> {
    runs.iter()
        .filter_map(|run| {
            run.result.as_ref().map(|result| ExportedResult {
                name: run.filename.clone(),
                total_time: result.time.total,
                ops_per_sec: result.ops_per_second.average,
            })
        })
        .collect()
}

/// [`export_results`] as a pretty-printed JSON array
pub fn export_results_json(runs: &[BenchmarkRun]) -> Result<String> {
    serde_json::to_string_pretty(&export_results(runs))
        .map_err(|err| OrchestratorError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{BenchmarkResult, FailureKind, Implementation};

    #[test]
    fn test_only_completed_runs_are_exported() {
        let mut done = BenchmarkRun::new(&Implementation::new("1", "fast.ts", ""));
        let mut result = BenchmarkResult::default();
        result.time.total = 12.5;
        result.ops_per_second.average = 8000.0;
        done.complete(result).unwrap();

        let mut failed = BenchmarkRun::new(&Implementation::new("2", "broken.ts", ""));
        failed.fail("nope", FailureKind::InvalidCode).unwrap();

        let json = export_results_json(&[done, failed]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "name": "fast.ts", "totalTime": 12.5, "opsPerSec": 8000.0 }])
        );
    }
}
