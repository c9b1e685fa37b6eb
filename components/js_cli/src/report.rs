//! Terminal and JSON output

use core_types::{BenchmarkResult, FailureKind, RunStatus};
use orchestrator::{format_count, format_margin, format_ops, format_time, BenchmarkRun, ConsoleLogEntry};
use serde::Serialize;

/// One run as printed by `--json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary<'a> {
    /// Implementation file name
    pub name: &'a str,
    /// Final status
    pub status: RunStatus,
    /// Failure message
    pub error: Option<&'a str>,
    /// Failure classification
    pub error_kind: Option<FailureKind>,
    /// Statistics of a completed run
    pub result: Option<&'a BenchmarkResult>,
}

impl<'a> From<&'a BenchmarkRun> for RunSummary<'a> {
    fn from(run: &'a BenchmarkRun) -> Self {
        RunSummary {
            name: &run.filename,
            status: run.status,
            error: run.error.as_deref(),
            error_kind: run.error_kind,
            result: run.result.as_ref(),
        }
    }
}

/// `--json` output
pub fn format_json(runs: &[BenchmarkRun]) -> serde_json::Result<String> {
    let summaries: Vec<RunSummary<'_>> = runs.iter().map(RunSummary::from).collect();
    serde_json::to_string_pretty(&summaries)
}

/// One captured console entry, prefixed with its file
pub fn format_console_line(filename: &str, entry: &ConsoleLogEntry) -> String {
    if entry.count > 1 {
        format!("[{}] {}: {} (x{})", filename, entry.level, entry.message, entry.count)
    } else {
        format!("[{}] {}: {}", filename, entry.level, entry.message)
    }
}

/// Result table
pub fn format_report(runs: &[BenchmarkRun]) -> String {
    let mut output = String::new();
    output.push('\n');
    output.push_str("jsbench results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let fastest = runs
        .iter()
        .filter_map(|run| run.result.as_ref())
        .map(|result| result.ops_per_second.average)
        .fold(0.0_f64, f64::max);

    for run in runs {
        let icon = match run.status {
            RunStatus::Completed => "✓",
            RunStatus::Failed => "✗",
            RunStatus::Cancelled => "⊘",
            RunStatus::Idle | RunStatus::Warmup | RunStatus::Running => "…",
        };
        output.push_str(&format!("  {} {}\n", icon, run.filename));

        match (&run.result, &run.error) {
            (Some(result), _) => {
                let ops = result.ops_per_second;
                let relative = if fastest > 0.0 && ops.average > 0.0 && ops.average < fastest {
                    format!("  ({:.2}x slower)", fastest / ops.average)
                } else if runs.len() > 1 {
                    "  (fastest)".to_string()
                } else {
                    String::new()
                };
                output.push_str(&format!(
                    "      {} ops/sec {}{}\n",
                    format_ops(ops.average),
                    format_margin(ops.margin),
                    relative
                ));
                output.push_str(&format!(
                    "      mean: {}  min: {}  max: {}\n",
                    format_time(result.time.average),
                    format_time(result.time.min),
                    format_time(result.time.max)
                ));
                output.push_str(&format!(
                    "      p50: {}  p90: {}  p95: {}\n",
                    format_time(result.time.percentile50),
                    format_time(result.time.percentile90),
                    format_time(result.time.percentile95)
                ));
                output.push_str(&format!(
                    "      samples: {}  batches: {}  total: {}\n",
                    format_count(result.samples),
                    format_count(result.batches),
                    format_time(result.time.total)
                ));
            }
            (None, Some(error)) => {
                let kind = run.error_kind.map(|kind| kind.as_str()).unwrap_or("ERROR");
                output.push_str(&format!("      {}: {}\n", kind, error));
            }
            (None, None) => output.push_str(&format!("      {}\n", run.status)),
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{ConsoleLevel, Implementation};

    fn completed(name: &str, ops: f64) -> BenchmarkRun {
        let mut run = BenchmarkRun::new(&Implementation::new(name, name, ""));
        let mut result = BenchmarkResult {
            samples: 1200,
            batches: 12,
            ..BenchmarkResult::default()
        };
        result.ops_per_second.average = ops;
        result.ops_per_second.margin = 0.5;
        result.time.average = 1000.0 / ops;
        run.complete(result).unwrap();
        run
    }

    #[test]
    fn test_report_ranks_against_fastest() {
        let mut failed = BenchmarkRun::new(&Implementation::new("c", "c.ts", ""));
        failed.fail("Unexpected token", FailureKind::InvalidCode).unwrap();
        let report = format_report(&[completed("a.ts", 2000.0), completed("b.ts", 1000.0), failed]);

        assert!(report.contains("✓ a.ts\n      2,000 ops/sec ±0.50%  (fastest)"));
        assert!(report.contains("1,000 ops/sec ±0.50%  (2.00x slower)"));
        assert!(report.contains("samples: 1,200  batches: 12"));
        assert!(report.contains("✗ c.ts\n      INVALID_CODE: Unexpected token"));
    }

    #[test]
    fn test_cancelled_run_has_no_error_line() {
        let mut run = BenchmarkRun::new(&Implementation::new("x", "x.js", ""));
        run.cancel().unwrap();
        assert!(format_report(&[run]).contains("⊘ x.js\n      cancelled\n"));
    }

    #[test]
    fn test_console_line_shows_repeat_count() {
        let entry = ConsoleLogEntry {
            level: ConsoleLevel::Warn,
            message: "slow".to_string(),
            timestamp: 0,
            count: 5,
        };
        assert_eq!(format_console_line("a.ts", &entry), "[a.ts] warn: slow (x5)");
    }

    #[test]
    fn test_json_summary_fields() {
        let json = format_json(&[completed("a.ts", 10.0)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "a.ts");
        assert_eq!(value[0]["status"], "completed");
        assert_eq!(value[0]["result"]["samples"], 1200);
        assert!(value[0]["errorKind"].is_null());
    }
}
