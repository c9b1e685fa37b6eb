//! The benchmark runner
//!
//! Tasks run strictly one after another. Each goes through
//! `idle -> warmup (optional) -> running -> completed | failed | cancelled`,
//! emitting [`RunnerEvent`]s along the way.

use core_types::{BenchmarkOptions, BenchmarkResult, Count, RunStatus};
use tracing::{debug, info};

use crate::calibrate::{self, Calibration, Warmup, MAX_BATCH_SIZE};
use crate::clock::Clock;
use crate::engine::{ContextHook, Engine, EngineConfig, InterruptHandle, JsTask, NoHook};
use crate::error::{Result, RunnerError};
use crate::events::{EventSink, Progress, RunnerEvent};
use crate::stats::{summarize, BatchSample};

const NS_PER_MS: f64 = 1_000_000.0;

/// Progress events are spaced at least this far apart
const PROGRESS_INTERVAL_NS: f64 = 16.0 * NS_PER_MS;

/// Highest progress reported before the result exists
pub const MAX_RUNNING_PROGRESS: f64 = 99.9;

/// One unit of compiled code to measure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Id echoed in every event
    pub id: String,
    /// Function body returning the `run` function
    pub code: String,
}

impl Task {
    /// Create a task
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            code: code.into(),
        }
    }
}

/// Runs tasks under one set of options
#[derive(Debug, Clone)]
pub struct Runner {
    options: BenchmarkOptions,
    engine: EngineConfig,
    interrupt: InterruptHandle,
}

impl Runner {
    /// Create a runner
    pub fn new(options: BenchmarkOptions) -> Self {
        Runner {
            options,
            engine: EngineConfig::default(),
            interrupt: InterruptHandle::new(),
        }
    }

    /// Override the JS runtime limits
    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Share an existing interrupt flag
    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Handle that cancels the current and all remaining tasks
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// The options in use
    pub fn options(&self) -> &BenchmarkOptions {
        &self.options
    }

    /// Run every task, returning one outcome per task in order
    pub fn run(&self, tasks: &[Task], sink: &mut dyn EventSink) -> Vec<Result<BenchmarkResult>> {
        self.run_with_hook(tasks, sink, &mut NoHook)
    }

    /// Like [`run`](Self::run), with `hook` wrapped around every task context
    pub fn run_with_hook(
        &self,
        tasks: &[Task],
        sink: &mut dyn EventSink,
        hook: &mut dyn ContextHook,
    ) -> Vec<Result<BenchmarkResult>> {
        let engine = match Engine::new(&self.engine, self.interrupt.clone()) {
            Ok(engine) => engine,
            Err(err) => {
                return tasks
                    .iter()
                    .map(|task| {
                        self.report(&task.id, Err(err.clone()), sink);
                        Err(err.clone())
                    })
                    .collect();
            }
        };

        tasks
            .iter()
            .map(|task| {
                if self.interrupt.is_interrupted() {
                    return Err(RunnerError::Cancelled);
                }
                sink.emit(RunnerEvent::TaskStart {
                    id: task.id.clone(),
                });
                let outcome = engine.with_context(hook, |ctx| {
                    sink.emit(RunnerEvent::Setup {
                        id: task.id.clone(),
                    });
                    let js = JsTask::compile(ctx, &task.code, self.interrupt.clone())?;
                    self.measure(&task.id, &mut || js.call(), sink)
                });
                sink.emit(RunnerEvent::Teardown {
                    id: task.id.clone(),
                });
                self.report(&task.id, outcome.clone(), sink);
                outcome
            })
            .collect()
    }

    fn report(&self, id: &str, outcome: Result<BenchmarkResult>, sink: &mut dyn EventSink) {
        match outcome {
            Ok(result) => {
                if !self.options.quiet {
                    info!(task = id, ops = result.ops_per_second.average, "task complete");
                }
                sink.emit(RunnerEvent::TaskComplete {
                    id: id.to_string(),
                    result,
                });
            }
            Err(RunnerError::Cancelled) => debug!(task = id, "task cancelled"),
            Err(err) => {
                if !self.options.quiet {
                    info!(task = id, error = %err, "task failed");
                }
                sink.emit(RunnerEvent::Error {
                    id: id.to_string(),
                    message: err.to_string(),
                    kind: err.kind(),
                });
            }
        }
    }

    /// Warm up, calibrate and measure one callable
    pub fn measure(
        &self,
        id: &str,
        call: &mut dyn FnMut() -> Result<()>,
        sink: &mut dyn EventSink,
    ) -> Result<BenchmarkResult> {
        let options = &self.options;
        let clock = Clock::new(options.method);
        let calibration = Calibration::measure(&clock);
        let mut state = TaskState::new(id);

        let interrupt = &self.interrupt;
        let mut time_batch = |calls: u64| -> Result<f64> {
            if interrupt.is_interrupted() {
                return Err(RunnerError::Cancelled);
            }
            let start = clock.now();
            for _ in 0..calls {
                call()?;
            }
            Ok(clock.now() - start)
        };

        let mut warmup = Warmup::default();
        if options.warmup.enabled {
            state.advance(RunStatus::Warmup);
            sink.emit(RunnerEvent::WarmupStart { id: id.to_string() });
            warmup = match options.warmup.iterations {
                Count::Auto => calibrate::auto_warmup(
                    &mut time_batch,
                    calibrate::auto_warmup_budget_ns(options.time),
                )?,
                Count::Fixed(calls) => calibrate::fixed_warmup(&mut time_batch, calls)?,
            };
            sink.emit(RunnerEvent::WarmupEnd { id: id.to_string() });
        }

        let cap = options.iterations.fixed().unwrap_or(MAX_BATCH_SIZE).clamp(1, MAX_BATCH_SIZE);
        let batch_size = match (options.batching.enabled, options.batching.size) {
            (false, _) => 1,
            (true, Count::Fixed(size)) => size.clamp(1, cap),
            (true, Count::Auto) => calibrate::ramp_batch_size(
                &mut time_batch,
                warmup.per_call_ns(),
                calibration.min_sample_ns,
                cap,
            )?,
        };

        state.advance(RunStatus::Running);
        if !options.quiet {
            info!(
                task = id,
                warmup_calls = warmup.calls,
                batch_size,
                resolution_ns = calibration.resolution_ns,
                "measuring"
            );
        }

        let mut batches = Vec::new();
        let mut progress = ProgressTracker::new(id, options.iterations);
        let start = clock.now();
        loop {
            let calls = match options.iterations {
                Count::Fixed(total) if progress.completed >= total => break,
                Count::Fixed(total) => batch_size.min(total - progress.completed),
                Count::Auto => batch_size,
            };
            let duration_ns = time_batch(calls)?;
            batches.push(BatchSample { calls, duration_ns });

            let elapsed_ns = clock.now() - start;
            progress.record(calls, elapsed_ns, options.time, sink);
            if options.iterations == Count::Auto && elapsed_ns >= options.time as f64 * NS_PER_MS {
                break;
            }
        }
        progress.finish(sink);

        state.advance(RunStatus::Completed);
        Ok(summarize(&batches))
    }
}

/// Lifecycle bookkeeping for one task
struct TaskState<'a> {
    id: &'a str,
    status: RunStatus,
}

impl<'a> TaskState<'a> {
    fn new(id: &'a str) -> Self {
        TaskState {
            id,
            status: RunStatus::Idle,
        }
    }

    fn advance(&mut self, next: RunStatus) {
        debug_assert!(self.status.can_transition_to(next));
        debug!(task = self.id, from = self.status.as_str(), to = next.as_str(), "task state");
        self.status = next;
    }
}

/// Throttled, non-decreasing progress reporting
struct ProgressTracker<'a> {
    id: &'a str,
    iterations: Count,
    completed: u64,
    elapsed_ns: f64,
    percent: f64,
    last_emit_ns: Option<f64>,
    pending: bool,
}

impl<'a> ProgressTracker<'a> {
    fn new(id: &'a str, iterations: Count) -> Self {
        ProgressTracker {
            id,
            iterations,
            completed: 0,
            elapsed_ns: 0.0,
            percent: 0.0,
            last_emit_ns: None,
            pending: false,
        }
    }

    fn record(&mut self, calls: u64, elapsed_ns: f64, time_ms: u64, sink: &mut dyn EventSink) {
        self.completed += calls;
        self.elapsed_ns = elapsed_ns;
        let fraction = match self.iterations {
            Count::Fixed(0) => 1.0,
            Count::Fixed(total) => self.completed as f64 / total as f64,
            Count::Auto if time_ms == 0 => 1.0,
            Count::Auto => elapsed_ns / (time_ms as f64 * NS_PER_MS),
        };
        self.percent = (fraction * 100.0).min(MAX_RUNNING_PROGRESS).max(self.percent);
        self.pending = true;

        let due = self
            .last_emit_ns
            .map_or(true, |last| elapsed_ns - last >= PROGRESS_INTERVAL_NS);
        if due {
            self.emit(sink);
        }
    }

    fn finish(&mut self, sink: &mut dyn EventSink) {
        if self.pending {
            self.emit(sink);
        }
    }

    fn emit(&mut self, sink: &mut dyn EventSink) {
        let iterations_total = match self.iterations {
            Count::Fixed(total) => total,
            Count::Auto if self.percent > 0.0 => {
                ((self.completed as f64 * 100.0 / self.percent).round() as u64).max(self.completed)
            }
            Count::Auto => self.completed,
        };
        sink.emit(RunnerEvent::Progress {
            id: self.id.to_string(),
            progress: Progress {
                progress: self.percent,
                iterations_completed: self.completed,
                iterations_total,
                elapsed_time: self.elapsed_ns / NS_PER_MS,
            },
        });
        self.last_emit_ns = Some(self.elapsed_ns);
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{BatchingOptions, FailureKind, TimingMethod, WarmupOptions};
    use std::time::Duration;

    fn fixed(iterations: u64) -> BenchmarkOptions {
        BenchmarkOptions {
            iterations: Count::Fixed(iterations),
            batching: BatchingOptions {
                enabled: false,
                size: Count::Auto,
            },
            warmup: WarmupOptions {
                enabled: false,
                iterations: Count::Auto,
            },
            quiet: true,
            ..BenchmarkOptions::default()
        }
    }

    #[test]
    fn test_fixed_delay_round_trip() {
        let runner = Runner::new(fixed(10));
        let mut events = Vec::new();
        let mut sink = |event: RunnerEvent| events.push(event);
        let mut call = || {
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        };
        let result = runner.measure("sleep", &mut call, &mut sink).unwrap();

        assert_eq!(result.samples, 10);
        assert_eq!(result.batches, 10);
        assert!(result.ops_per_second.average <= 500.0 * 1.01);
        assert!(result.ops_per_second.average > 250.0);
        assert!(result.time.min >= 2.0);
    }

    #[test]
    fn test_progress_is_monotonic_and_below_100() {
        let mut options = fixed(200);
        options.batching = BatchingOptions {
            enabled: true,
            size: Count::Fixed(7),
        };
        let runner = Runner::new(options);
        let mut events = Vec::new();
        let mut sink = |event: RunnerEvent| events.push(event);
        let result = runner.measure("p", &mut || Ok(()), &mut sink).unwrap();
        assert_eq!(result.samples, 200);
        assert_eq!(result.batches, 29);

        let progress: Vec<Progress> = events
            .iter()
            .filter_map(|event| match event {
                RunnerEvent::Progress { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect();
        assert!(!progress.is_empty());
        assert!(progress.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert!(progress.iter().all(|p| p.progress <= MAX_RUNNING_PROGRESS));
        let last = progress.last().unwrap();
        assert_eq!(last.iterations_completed, 200);
        assert_eq!(last.iterations_total, 200);
    }

    #[test]
    fn test_auto_iterations_respect_time_budget() {
        let options = BenchmarkOptions {
            time: 30,
            method: TimingMethod::PerformanceNow,
            quiet: true,
            ..BenchmarkOptions::default()
        };
        let runner = Runner::new(options);
        let mut sink = |_: RunnerEvent| {};
        let started = std::time::Instant::now();
        let result = runner.measure("auto", &mut || Ok(()), &mut sink).unwrap();
        assert!(result.samples > 0);
        assert!(result.batches > 0);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_warmup_events_bracket_warmup() {
        let mut options = fixed(3);
        options.warmup = WarmupOptions {
            enabled: true,
            iterations: Count::Fixed(5),
        };
        let runner = Runner::new(options);
        let mut calls = 0;
        let mut events = Vec::new();
        let mut sink = |event: RunnerEvent| events.push(event);
        runner
            .measure(
                "w",
                &mut || {
                    calls += 1;
                    Ok(())
                },
                &mut sink,
            )
            .unwrap();
        assert_eq!(calls, 8);
        assert!(matches!(events[0], RunnerEvent::WarmupStart { .. }));
        assert!(matches!(events[1], RunnerEvent::WarmupEnd { .. }));
    }

    #[test]
    fn test_failing_task_does_not_stop_siblings() {
        let runner = Runner::new(fixed(5));
        let tasks = [
            Task::new("a", "return () => 1;"),
            Task::new("b", "return function run() { throw new Error(\"nope\"); };"),
            Task::new("c", "let s = 0;\nreturn function run() { s += 1; };"),
        ];
        let mut events = Vec::new();
        let mut sink = |event: RunnerEvent| events.push(event);
        let outcomes = runner.run(&tasks, &mut sink);

        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1], Err(RunnerError::execution("nope")));
        assert_eq!(outcomes[2].as_ref().unwrap().samples, 5);
        assert!(events.contains(&RunnerEvent::Error {
            id: "b".to_string(),
            message: "nope".to_string(),
            kind: FailureKind::ExecutionError,
        }));
        let order: Vec<&str> = events
            .iter()
            .filter(|e| matches!(e, RunnerEvent::TaskStart { .. }))
            .map(RunnerEvent::id)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lifecycle_order_for_one_task() {
        let mut options = fixed(2);
        options.warmup.enabled = true;
        options.warmup.iterations = Count::Fixed(1);
        let runner = Runner::new(options);
        let mut events = Vec::new();
        let mut sink = |event: RunnerEvent| events.push(event);
        runner.run(&[Task::new("t", "return () => {};")], &mut sink);

        let mut names: Vec<&str> = events
            .iter()
            .map(|event| match event {
                RunnerEvent::TaskStart { .. } => "taskStart",
                RunnerEvent::Setup { .. } => "setup",
                RunnerEvent::WarmupStart { .. } => "warmupStart",
                RunnerEvent::WarmupEnd { .. } => "warmupEnd",
                RunnerEvent::Progress { .. } => "progress",
                RunnerEvent::Teardown { .. } => "teardown",
                RunnerEvent::TaskComplete { .. } => "taskComplete",
                RunnerEvent::Error { .. } => "error",
            })
            .collect();
        names.dedup();
        assert_eq!(
            names,
            vec!["taskStart", "setup", "warmupStart", "warmupEnd", "progress", "teardown", "taskComplete"]
        );
    }

    #[test]
    fn test_interrupted_runner_cancels_remaining_tasks() {
        let runner = Runner::new(fixed(1));
        runner.interrupt_handle().interrupt();
        let mut sink = |_: RunnerEvent| {};
        let outcomes = runner.run(&[Task::new("x", "return () => {};")], &mut sink);
        assert_eq!(outcomes, vec![Err(RunnerError::Cancelled)]);
    }

    #[test]
    fn test_async_run_is_awaited() {
        let runner = Runner::new(fixed(4));
        let mut sink = |_: RunnerEvent| {};
        let code = "let settled = 0;\nreturn async function run() { await null; settled++; };";
        let outcomes = runner.run(&[Task::new("async", code)], &mut sink);
        assert_eq!(outcomes[0].as_ref().unwrap().samples, 4);
    }
}
