//! Aggregate statistics over timing samples

use core_types::{BenchmarkResult, OpsStats, TimeStats};

const NS_PER_MS: f64 = 1_000_000.0;

/// Two-sided 95% Student's t critical values for 1..=30 degrees of freedom
const T_TABLE: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

/// Normal approximation beyond the table
const Z_95: f64 = 1.96;

/// One timed batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSample {
    /// Calls made in the batch
    pub calls: u64,
    /// Wall-clock duration of the whole batch, in nanoseconds
    pub duration_ns: f64,
}

impl BatchSample {
    /// Per-call time in milliseconds
    pub fn per_call_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.duration_ns / self.calls as f64 / NS_PER_MS
        }
    }
}

/// Critical value for `degrees_of_freedom`
pub fn t_critical(degrees_of_freedom: usize) -> f64 {
    match degrees_of_freedom {
        0 => f64::NAN,
        df if df <= T_TABLE.len() => T_TABLE[df - 1],
        _ => Z_95,
    }
}

/// Linear-interpolated percentile of sorted values, `p` in `0..=1`
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Relative margin of error at 95% confidence, in percent
pub fn relative_margin(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let standard_error = variance.sqrt() / (n as f64).sqrt();
    t_critical(n - 1) * standard_error / mean * 100.0
}

fn ops(per_call_ms: f64) -> f64 {
    if per_call_ms > 0.0 {
        1000.0 / per_call_ms
    } else {
        0.0
    }
}

/// Summarize measured batches
pub fn summarize(batches: &[BatchSample]) -> BenchmarkResult {
    let samples: u64 = batches.iter().map(|b| b.calls).sum();
    let total = batches.iter().map(|b| b.duration_ns).sum::<f64>() / NS_PER_MS;
    let average = if samples > 0 { total / samples as f64 } else { 0.0 };

    let mut per_call: Vec<f64> = batches.iter().map(BatchSample::per_call_ms).collect();
    per_call.sort_by(f64::total_cmp);
    let min = per_call.first().copied().unwrap_or(0.0);
    let max = per_call.last().copied().unwrap_or(0.0);

    BenchmarkResult {
        samples,
        batches: batches.len() as u64,
        time: TimeStats {
            total,
            min,
            max,
            average,
            percentile50: percentile(&per_call, 0.50),
            percentile90: percentile(&per_call, 0.90),
            percentile95: percentile(&per_call, 0.95),
        },
        ops_per_second: OpsStats {
            average: ops(average),
            min: ops(max),
            max: ops(min),
            margin: relative_margin(&per_call),
        },
    }
}
