//! Benchmark measurement options.
//!
//! Options are deserialized from camelCase JSON. Every level carries
//! `#[serde(default)]`, so a partial document is merged over the defaults.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A count that is either picked automatically or fixed by the user.
///
/// Serialized as the string `"auto"` or a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Count {
    /// Let the runner decide
    #[default]
    Auto,
    /// Exactly this many
    Fixed(u64),
}

impl Count {
    /// The fixed value, if any
    pub fn fixed(&self) -> Option<u64> {
        match self {
            Count::Auto => None,
            Count::Fixed(n) => Some(*n),
        }
    }
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Count::Auto => serializer.serialize_str("auto"),
            Count::Fixed(n) => serializer.serialize_u64(*n),
        }
    }
}

struct CountVisitor;

impl<'de> Visitor<'de> for CountVisitor {
    type Value = Count;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"auto\" or a non-negative integer")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Count, E> {
        if value == "auto" {
            Ok(Count::Auto)
        } else {
            value
                .parse::<u64>()
                .map(Count::Fixed)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Count, E> {
        Ok(Count::Fixed(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Count, E> {
        u64::try_from(value)
            .map(Count::Fixed)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Count, E> {
        if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
            Ok(Count::Fixed(value as u64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Count, D::Error> {
        deserializer.deserialize_any(CountVisitor)
    }
}

/// Which clock the runner reads for timing samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimingMethod {
    /// Highest-resolution clock available
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Monotonic nanosecond clock
    #[serde(rename = "hrtime")]
    Hrtime,
    /// Browser-style coarsened millisecond clock
    #[serde(rename = "performance.now")]
    PerformanceNow,
}

/// Batching configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchingOptions {
    /// Group several calls into one timing sample
    pub enabled: bool,
    /// Calls per sample
    pub size: Count,
}

impl Default for BatchingOptions {
    fn default() -> Self {
        BatchingOptions {
            enabled: true,
            size: Count::Auto,
        }
    }
}

/// Warmup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WarmupOptions {
    /// Run discarded iterations before measuring
    pub enabled: bool,
    /// Number of discarded calls
    pub iterations: Count,
}

impl Default for WarmupOptions {
    fn default() -> Self {
        WarmupOptions {
            enabled: true,
            iterations: Count::Auto,
        }
    }
}

/// Options for one benchmark batch.
///
/// # Examples
///
/// ```
/// use core_types::{BenchmarkOptions, Count, TimingMethod};
///
/// let options: BenchmarkOptions =
///     serde_json::from_str(r#"{"batching": {"size": 64}, "method": "performance.now"}"#).unwrap();
///
/// assert!(options.batching.enabled);
/// assert_eq!(options.batching.size, Count::Fixed(64));
/// assert_eq!(options.method, TimingMethod::PerformanceNow);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BenchmarkOptions {
    /// `auto` runs until `time` elapses, otherwise exactly this many calls
    pub iterations: Count,
    /// Time budget in milliseconds for `auto` iterations
    pub time: u64,
    /// Batching configuration
    pub batching: BatchingOptions,
    /// Warmup configuration
    pub warmup: WarmupOptions,
    /// Timing source
    pub method: TimingMethod,
    /// Suppress the runner's own logging
    pub quiet: bool,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        BenchmarkOptions {
            iterations: Count::Auto,
            time: 1000,
            batching: BatchingOptions::default(),
            warmup: WarmupOptions::default(),
            method: TimingMethod::Auto,
            quiet: false,
        }
    }
}
