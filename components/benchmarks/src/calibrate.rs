//! Warmup and batch-size calibration
//!
//! Every routine here drives a `time_batch(calls)` callback that runs `calls`
//! consecutive calls and returns their wall-clock duration in nanoseconds.

use crate::clock::Clock;
use crate::error::Result;

/// Smallest batch duration ever accepted as a sample
pub const MIN_SAMPLE_FLOOR_NS: f64 = 10_000.0;

/// Relative timer error tolerated per sample
pub const TARGET_RELATIVE_ERROR: f64 = 0.01;

/// Upper bound on calls per batch
pub const MAX_BATCH_SIZE: u64 = 1 << 20;

/// Auto warmup stops after this many calls
pub const AUTO_WARMUP_CALL_LIMIT: u64 = 1024;

const AUTO_WARMUP_SHARE: f64 = 0.1;
const AUTO_WARMUP_CAP_MS: f64 = 250.0;

/// Timer characteristics for one measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Observed clock tick, in nanoseconds
    pub resolution_ns: f64,
    /// Shortest batch duration with acceptable relative error
    pub min_sample_ns: f64,
}

impl Calibration {
    /// Measure the clock's resolution
    pub fn measure(clock: &Clock) -> Self {
        Calibration::from_resolution(clock.resolution())
    }

    /// Calibration for a known resolution
    pub fn from_resolution(resolution_ns: f64) -> Self {
        Calibration {
            resolution_ns,
            min_sample_ns: (resolution_ns / TARGET_RELATIVE_ERROR).max(MIN_SAMPLE_FLOOR_NS),
        }
    }
}

/// What a warmup observed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Warmup {
    /// Calls made
    pub calls: u64,
    /// Total duration of those calls, in nanoseconds
    pub duration_ns: f64,
}

impl Warmup {
    /// Mean cost of one call, if anything was measured
    pub fn per_call_ns(&self) -> Option<f64> {
        (self.calls > 0 && self.duration_ns > 0.0).then(|| self.duration_ns / self.calls as f64)
    }
}

/// Warmup time budget for an `auto` warmup, in nanoseconds
pub fn auto_warmup_budget_ns(time_ms: u64) -> f64 {
    (time_ms as f64 * AUTO_WARMUP_SHARE).min(AUTO_WARMUP_CAP_MS) * 1_000_000.0
}

/// Run batches of 1, 2, 4, ... calls until the budget or call limit is spent
pub fn auto_warmup<F>(time_batch: &mut F, budget_ns: f64) -> Result<Warmup>
where
    F: FnMut(u64) -> Result<f64>,
{
    let mut warmup = Warmup::default();
    let mut size = 1;
    while warmup.calls < AUTO_WARMUP_CALL_LIMIT && warmup.duration_ns < budget_ns {
        let calls = size.min(AUTO_WARMUP_CALL_LIMIT - warmup.calls);
        warmup.duration_ns += time_batch(calls)?;
        warmup.calls += calls;
        size *= 2;
    }
    Ok(warmup)
}

/// Spend exactly `calls` warmup calls
pub fn fixed_warmup<F>(time_batch: &mut F, calls: u64) -> Result<Warmup>
where
    F: FnMut(u64) -> Result<f64>,
{
    let duration_ns = if calls > 0 { time_batch(calls)? } else { 0.0 };
    Ok(Warmup { calls, duration_ns })
}

/// Pick the smallest batch size whose duration reaches `min_sample_ns`.
///
/// Starts from the warmup estimate (or 1) and doubles until a measured batch
/// is long enough. Calls spent here are not part of the result.
pub fn ramp_batch_size<F>(
    time_batch: &mut F,
    per_call_estimate_ns: Option<f64>,
    min_sample_ns: f64,
    cap: u64,
) -> Result<u64>
where
    F: FnMut(u64) -> Result<f64>,
{
    let cap = cap.clamp(1, MAX_BATCH_SIZE);
    let mut size = match per_call_estimate_ns {
        Some(estimate) => {
            let size = (min_sample_ns / estimate).ceil().clamp(1.0, cap as f64) as u64;
            if size == 1 {
                return Ok(1);
            }
            size
        }
        None => 1,
    };
    loop {
        let duration = time_batch(size)?;
        if duration >= min_sample_ns || size >= cap {
            return Ok(size);
        }
        size = (size * 2).min(cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Batches that cost `per_call` ns per call, recording the sizes asked for
    fn fake(per_call: f64, sizes: &mut Vec<u64>) -> impl FnMut(u64) -> Result<f64> + '_ {
        move |calls| {
            sizes.push(calls);
            Ok(calls as f64 * per_call)
        }
    }

    #[test]
    fn test_min_sample_has_a_floor() {
        assert_eq!(Calibration::from_resolution(20.0).min_sample_ns, MIN_SAMPLE_FLOOR_NS);
        assert_eq!(Calibration::from_resolution(5_000.0).min_sample_ns, 500_000.0);
    }

    #[test]
    fn test_auto_warmup_stops_at_call_limit() {
        let mut sizes = Vec::new();
        let warmup = auto_warmup(&mut fake(1.0, &mut sizes), 1e12).unwrap();
        assert_eq!(warmup.calls, AUTO_WARMUP_CALL_LIMIT);
        assert_eq!(sizes[..4], [1, 2, 4, 8]);
        assert_eq!(sizes.iter().sum::<u64>(), AUTO_WARMUP_CALL_LIMIT);
    }

    #[test]
    fn test_auto_warmup_stops_at_budget() {
        let mut sizes = Vec::new();
        let warmup = auto_warmup(&mut fake(40_000_000.0, &mut sizes), 100_000_000.0).unwrap();
        assert_eq!(sizes, vec![1, 2]);
        assert_eq!(warmup.per_call_ns(), Some(40_000_000.0));
    }

    #[test]
    fn test_auto_warmup_budget_is_capped() {
        assert_eq!(auto_warmup_budget_ns(1000), 100_000_000.0);
        assert_eq!(auto_warmup_budget_ns(60_000), 250_000_000.0);
    }

    #[test]
    fn test_ramp_doubles_until_long_enough() {
        let mut sizes = Vec::new();
        let size = ramp_batch_size(&mut fake(100.0, &mut sizes), None, 10_000.0, MAX_BATCH_SIZE).unwrap();
        assert_eq!(size, 128);
        assert_eq!(sizes, vec![1, 2, 4, 8, 16, 32, 64, 128]);
    }

    #[test]
    fn test_ramp_starts_from_estimate() {
        let mut sizes = Vec::new();
        let size =
            ramp_batch_size(&mut fake(100.0, &mut sizes), Some(100.0), 10_000.0, MAX_BATCH_SIZE).unwrap();
        assert_eq!(size, 100);
        assert_eq!(sizes, vec![100]);
    }

    #[test]
    fn test_slow_calls_need_no_batching() {
        let mut sizes = Vec::new();
        let size = ramp_batch_size(&mut fake(1e6, &mut sizes), Some(1e6), 10_000.0, 50).unwrap();
        assert_eq!(size, 1);
        assert!(sizes.is_empty());
    }

    #[test]
    fn test_ramp_respects_cap() {
        let mut sizes = Vec::new();
        let size = ramp_batch_size(&mut fake(1.0, &mut sizes), None, 10_000.0, 20).unwrap();
        assert_eq!(size, 20);
        assert_eq!(sizes, vec![1, 2, 4, 8, 16, 20]);
    }
}
