//! Benchmark Runner Core
//!
//! Measures compiled benchmark code on an embedded QuickJS engine: warmup,
//! batch calibration, timed measurement and statistics.
//!
//! # Structure
//!
//! - [`Runner`] - Runs [`Task`]s sequentially and emits [`RunnerEvent`]s
//! - [`Engine`] / [`JsTask`] - Fresh JS context per task, interruptible
//! - [`calibrate`] - Warmup and auto batch sizing
//! - [`stats`] - Per-call statistics and the margin of error
//!
//! # Example
//!
//! ```
//! use benchmarks::{Runner, RunnerEvent, Task};
//! use core_types::{BenchmarkOptions, Count};
//!
//! let options = BenchmarkOptions { iterations: Count::Fixed(50), ..Default::default() };
//! let runner = Runner::new(options);
//! let tasks = [Task::new("sum", "return function run() { return [1, 2, 3].reduce((a, b) => a + b); };")];
//!
//! let mut events = Vec::new();
//! let outcomes = runner.run(&tasks, &mut |event: RunnerEvent| events.push(event));
//! assert_eq!(outcomes[0].as_ref().unwrap().samples, 50);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calibrate;
pub mod clock;
mod engine;
mod error;
mod events;
mod runner;
pub mod stats;

pub use clock::Clock;
pub use engine::{
    ContextHook, Engine, EngineConfig, InterruptHandle, JsTask, NoHook, DEFAULT_MEMORY_LIMIT,
    DEFAULT_STACK_SIZE,
};
pub use error::{Result, RunnerError};
pub use events::{EventSink, Progress, RunnerEvent};
pub use runner::{Runner, Task, MAX_RUNNING_PROGRESS};
