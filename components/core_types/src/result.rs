//! Statistics snapshot of a completed benchmark.

use serde::{Deserialize, Serialize};

/// Per-call timing distribution, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStats {
    /// Sum of all measured batch durations
    pub total: f64,
    /// Fastest per-call time
    pub min: f64,
    /// Slowest per-call time
    pub max: f64,
    /// Mean per-call time
    pub average: f64,
    /// Median per-call time
    pub percentile50: f64,
    /// 90th percentile per-call time
    pub percentile90: f64,
    /// 95th percentile per-call time
    pub percentile95: f64,
}

/// Throughput derived from per-call times.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpsStats {
    /// Operations per second at the mean per-call time
    pub average: f64,
    /// Operations per second at the slowest per-call time
    pub min: f64,
    /// Operations per second at the fastest per-call time
    pub max: f64,
    /// Relative margin of error at 95% confidence, in percent
    pub margin: f64,
}

/// Immutable statistics attached to a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    /// Number of measured calls
    pub samples: u64,
    /// Number of timing samples (batches)
    pub batches: u64,
    /// Timing distribution
    pub time: TimeStats,
    /// Throughput
    pub ops_per_second: OpsStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_json_field_names() {
        let json = serde_json::to_value(BenchmarkResult::default()).unwrap();
        assert!(json.get("opsPerSecond").is_some());
        assert!(json["time"].get("percentile95").is_some());
        assert!(json["opsPerSecond"].get("margin").is_some());
    }
}
