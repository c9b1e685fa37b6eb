//! Worker configuration

use std::time::Duration;

use benchmarks::EngineConfig;

/// Captured console output is sent to the host at least this often
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Settings for one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Console flush interval
    pub flush_interval: Duration,
    /// JS heap and stack limits
    pub engine: EngineConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            engine: EngineConfig::default(),
        }
    }
}
