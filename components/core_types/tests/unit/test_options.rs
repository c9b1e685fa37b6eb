//! Unit tests for BenchmarkOptions parsing

use core_types::{BenchmarkOptions, Count, TimingMethod};

#[cfg(test)]
mod option_parsing_tests {
    use super::*;

    #[test]
    fn test_full_document() {
        let json = r#"{
            "iterations": 1000,
            "time": 250,
            "batching": {"enabled": false, "size": "auto"},
            "warmup": {"enabled": true, "iterations": 32},
            "method": "hrtime",
            "quiet": true
        }"#;
        let options: BenchmarkOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.iterations, Count::Fixed(1000));
        assert_eq!(options.time, 250);
        assert!(!options.batching.enabled);
        assert_eq!(options.warmup.iterations.fixed(), Some(32));
        assert_eq!(options.method, TimingMethod::Hrtime);
        assert!(options.quiet);
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let result = serde_json::from_str::<BenchmarkOptions>(r#"{"method": "rdtsc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut options = BenchmarkOptions::default();
        options.iterations = Count::Fixed(7);
        options.method = TimingMethod::PerformanceNow;
        let json = serde_json::to_string(&options).unwrap();
        let back: BenchmarkOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
