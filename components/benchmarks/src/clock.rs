//! Timing sources

use std::time::Instant;

use core_types::TimingMethod;

/// Granularity of the coarsened `performance.now` clock, in nanoseconds
pub const COARSE_RESOLUTION_NS: f64 = 5_000.0;

const RESOLUTION_TRIALS: usize = 32;
const RESOLUTION_SPIN_LIMIT: usize = 1_000_000;

/// Monotonic clock reading nanoseconds since its creation
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    method: TimingMethod,
    origin: Instant,
}

impl Clock {
    /// Clock for `method`; `auto` selects `hrtime`
    pub fn new(method: TimingMethod) -> Self {
        let method = match method {
            TimingMethod::Auto => TimingMethod::Hrtime,
            other => other,
        };
        Clock {
            method,
            origin: Instant::now(),
        }
    }

    /// The method actually in use
    pub fn method(&self) -> TimingMethod {
        self.method
    }

    /// Current reading in nanoseconds
    pub fn now(&self) -> f64 {
        let ns = self.origin.elapsed().as_nanos() as f64;
        match self.method {
            TimingMethod::PerformanceNow => (ns / COARSE_RESOLUTION_NS).floor() * COARSE_RESOLUTION_NS,
            TimingMethod::Auto | TimingMethod::Hrtime => ns,
        }
    }

    /// Smallest observable non-zero tick, in nanoseconds
    pub fn resolution(&self) -> f64 {
        let mut best = f64::INFINITY;
        for _ in 0..RESOLUTION_TRIALS {
            let start = self.now();
            let mut spins = 0;
            let mut next = self.now();
            while next <= start && spins < RESOLUTION_SPIN_LIMIT {
                next = self.now();
                spins += 1;
            }
            if next > start {
                best = best.min(next - start);
            }
        }
        if best.is_finite() {
            best
        } else {
            COARSE_RESOLUTION_NS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_is_hrtime() {
        assert_eq!(Clock::new(TimingMethod::Auto).method(), TimingMethod::Hrtime);
    }

    #[test]
    fn test_coarse_clock_is_quantized() {
        let clock = Clock::new(TimingMethod::PerformanceNow);
        for _ in 0..100 {
            assert_eq!(clock.now() % COARSE_RESOLUTION_NS, 0.0);
        }
        assert!(clock.resolution() >= COARSE_RESOLUTION_NS);
    }

    #[test]
    fn test_hrtime_is_fine_grained() {
        let clock = Clock::new(TimingMethod::Hrtime);
        let resolution = clock.resolution();
        assert!(resolution > 0.0);
        assert!(resolution < COARSE_RESOLUTION_NS);
    }
}
