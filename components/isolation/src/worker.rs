//! The worker thread
//!
//! Each [`Worker`] owns one OS thread running the benchmark runner. Commands
//! travel over a crossbeam channel; messages come back over a tokio channel
//! so the host can await them. Termination raises the engine's interrupt
//! flag, so even a task stuck in an infinite loop stops at its next
//! interrupt check, and never waits for the thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use benchmarks::{EventSink, InterruptHandle, Runner, RunnerEvent, Task};
use core_types::BenchmarkOptions;
use crossbeam::channel::{self, Receiver, Sender};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::config::WorkerConfig;
use crate::console::{ConsoleCapture, ConsoleShim};
use crate::error::{IsolationError, Result};
use crate::messages::{HostMessage, RunRequest, WorkerMessage};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

enum Command {
    Host(HostMessage),
    Shutdown,
}

/// Worker-to-host sender that goes quiet once the worker is terminated
#[derive(Clone)]
pub(crate) struct Outbox {
    events: UnboundedSender<WorkerMessage>,
    interrupt: InterruptHandle,
}

impl Outbox {
    pub(crate) fn new(events: UnboundedSender<WorkerMessage>, interrupt: InterruptHandle) -> Self {
        Outbox { events, interrupt }
    }

    pub(crate) fn send(&self, message: WorkerMessage) {
        if self.interrupt.is_interrupted() {
            return;
        }
        if self.events.send(message).is_err() {
            debug!("host stopped listening");
        }
    }
}

/// Cloneable control side of a worker
#[derive(Clone)]
pub struct WorkerHandle {
    id: u64,
    commands: Sender<Command>,
    interrupt: InterruptHandle,
}

impl WorkerHandle {
    /// Worker id, unique per process
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Post a message to the worker
    pub fn send(&self, message: HostMessage) -> Result<()> {
        if self.is_terminated() {
            return Err(IsolationError::Terminated(self.id));
        }
        self.commands
            .send(Command::Host(message))
            .map_err(|_| IsolationError::Terminated(self.id))
    }

    /// Hard-stop the worker. Idempotent.
    pub fn terminate(&self) {
        if self.is_terminated() {
            return;
        }
        self.interrupt.interrupt();
        let _ = self.commands.send(Command::Shutdown);
        info!(worker = self.id, "worker terminated");
    }

    /// True once [`terminate`](Self::terminate) was called
    pub fn is_terminated(&self) -> bool {
        self.interrupt.is_interrupted()
    }
}

/// An isolated benchmark context
pub struct Worker {
    handle: WorkerHandle,
    events: UnboundedReceiver<WorkerMessage>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start a worker thread
    pub fn spawn(config: WorkerConfig) -> Result<Self> {
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        let (commands, command_rx) = channel::unbounded();
        let (event_tx, events) = mpsc::unbounded_channel();
        let interrupt = InterruptHandle::new();
        let outbox = Outbox::new(event_tx, interrupt.clone());

        let worker_interrupt = interrupt.clone();
        let thread = thread::Builder::new()
            .name(format!("bench-worker-{}", id))
            .spawn(move || worker_main(id, config, command_rx, outbox, worker_interrupt))
            .map_err(|err| IsolationError::Spawn(err.to_string()))?;
        debug!(worker = id, "worker spawned");

        Ok(Worker {
            handle: WorkerHandle {
                id,
                commands,
                interrupt,
            },
            events,
            thread: Some(thread),
        })
    }

    /// Worker id
    pub fn id(&self) -> u64 {
        self.handle.id
    }

    /// Control handle usable from other tasks
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Post a message to the worker
    pub fn send(&self, message: HostMessage) -> Result<()> {
        self.handle.send(message)
    }

    /// Next message, or `None` once the worker is gone and drained
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.events.recv().await
    }

    /// Next message if one is already queued
    pub fn try_recv(&mut self) -> Option<WorkerMessage> {
        match self.events.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Hard-stop the worker without waiting for its thread
    pub fn terminate(&mut self) {
        self.handle.terminate();
        self.events.close();
        // Detached: a task stuck outside an interrupt check must not block the host
        drop(self.thread.take());
    }

    /// True once terminated
    pub fn is_terminated(&self) -> bool {
        self.handle.is_terminated()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn worker_main(
    id: u64,
    config: WorkerConfig,
    commands: Receiver<Command>,
    outbox: Outbox,
    interrupt: InterruptHandle,
) {
    debug!(worker = id, "worker started");
    let capture = ConsoleCapture::new(outbox.clone(), config.flush_interval);
    while let Ok(command) = commands.recv() {
        match command {
            Command::Host(HostMessage::Start { runs, options }) => {
                run_batch(&config, runs, options, &outbox, &capture, &interrupt)
            }
            Command::Shutdown => break,
        }
        if interrupt.is_interrupted() {
            break;
        }
    }
    debug!(worker = id, "worker stopped");
}

fn run_batch(
    config: &WorkerConfig,
    runs: Vec<RunRequest>,
    options: BenchmarkOptions,
    outbox: &Outbox,
    capture: &ConsoleCapture,
    interrupt: &InterruptHandle,
) {
    let tasks: Vec<Task> = runs
        .into_iter()
        .map(|run| Task::new(run.run_id, run.processed_code))
        .collect();
    let ticking = capture.clone();
    let runner = Runner::new(options)
        .with_engine_config(config.engine)
        .with_interrupt(interrupt.clone().with_tick(move || ticking.flush_if_due()));

    let mut sink = WorkerSink {
        outbox: outbox.clone(),
        capture: capture.clone(),
    };
    let mut shim = ConsoleShim::new(capture.clone());
    let outcomes = runner.run_with_hook(&tasks, &mut sink, &mut shim);
    let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    if failed > 0 {
        warn!(failed, total = tasks.len(), "batch finished with failures");
    }
}

/// Translates runner events into protocol messages
struct WorkerSink {
    outbox: Outbox,
    capture: ConsoleCapture,
}

impl EventSink for WorkerSink {
    fn emit(&mut self, event: RunnerEvent) {
        let message = match event {
            RunnerEvent::TaskStart { id } => {
                self.capture.begin(&id);
                WorkerMessage::TaskStart { run_id: id }
            }
            RunnerEvent::Setup { id } => WorkerMessage::Setup { run_id: id },
            RunnerEvent::WarmupStart { id } => WorkerMessage::WarmupStart { run_id: id },
            RunnerEvent::WarmupEnd { id } => WorkerMessage::WarmupEnd { run_id: id },
            RunnerEvent::Progress { id, progress } => {
                self.capture.flush_if_due();
                WorkerMessage::Progress {
                    run_id: id,
                    progress: progress.progress,
                    elapsed_time: progress.elapsed_time,
                    iterations_completed: progress.iterations_completed,
                    total_iterations: progress.iterations_total,
                }
            }
            RunnerEvent::Teardown { id } => {
                self.capture.end();
                WorkerMessage::Teardown { run_id: id }
            }
            RunnerEvent::TaskComplete { id, result } => {
                self.outbox.send(WorkerMessage::TaskComplete {
                    run_id: id.clone(),
                });
                WorkerMessage::Result { run_id: id, result }
            }
            RunnerEvent::Error { id, message, kind } => WorkerMessage::Error {
                run_id: id,
                error: message,
                kind,
            },
        };
        self.outbox.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{BatchingOptions, ConsoleLevel, Count, FailureKind, WarmupOptions};
    use std::collections::HashMap;

    fn quick_options(iterations: u64) -> BenchmarkOptions {
        BenchmarkOptions {
            iterations: Count::Fixed(iterations),
            warmup: WarmupOptions {
                enabled: false,
                iterations: Count::Auto,
            },
            batching: BatchingOptions {
                enabled: false,
                size: Count::Auto,
            },
            quiet: true,
            ..BenchmarkOptions::default()
        }
    }

    async fn collect_until_terminal(worker: &mut Worker, runs: usize) -> Vec<WorkerMessage> {
        let mut messages = Vec::new();
        let mut terminal = 0;
        while terminal < runs {
            let message = worker.recv().await.expect("worker closed early");
            if message.is_terminal() {
                terminal += 1;
            }
            messages.push(message);
        }
        messages
    }

    #[tokio::test]
    async fn test_runs_report_in_order_and_failures_are_isolated() {
        let mut worker = Worker::spawn(WorkerConfig::default()).unwrap();
        worker
            .send(HostMessage::Start {
                runs: vec![
                    RunRequest::new("ok", "return () => 1;"),
                    RunRequest::new("bad", "return function run() { throw new RangeError(\"out\"); };"),
                    RunRequest::new("also-ok", "return () => [1, 2].map((x) => x * 2);"),
                ],
                options: quick_options(5),
            })
            .unwrap();

        let messages = collect_until_terminal(&mut worker, 3).await;
        let mut last: HashMap<&str, &WorkerMessage> = HashMap::new();
        for message in &messages {
            last.insert(message.run_id(), message);
        }
        assert!(matches!(last["ok"], WorkerMessage::Result { result, .. } if result.samples == 5));
        assert!(matches!(
            last["bad"],
            WorkerMessage::Error { error, kind: FailureKind::ExecutionError, .. } if error == "out"
        ));
        assert!(matches!(last["also-ok"], WorkerMessage::Result { .. }));

        let starts: Vec<&str> = messages
            .iter()
            .filter(|m| matches!(m, WorkerMessage::TaskStart { .. }))
            .map(WorkerMessage::run_id)
            .collect();
        assert_eq!(starts, vec!["ok", "bad", "also-ok"]);
    }

    #[tokio::test]
    async fn test_console_output_precedes_result() {
        let mut worker = Worker::spawn(WorkerConfig::default()).unwrap();
        worker
            .send(HostMessage::Start {
                runs: vec![RunRequest::new(
                    "log",
                    "return function run() { console.warn(\"hot\"); };",
                )],
                options: quick_options(3),
            })
            .unwrap();

        let messages = collect_until_terminal(&mut worker, 1).await;
        let batch = messages
            .iter()
            .position(|m| matches!(m, WorkerMessage::ConsoleBatch { .. }))
            .unwrap();
        let result = messages.iter().position(WorkerMessage::is_terminal).unwrap();
        assert!(batch < result);
        match &messages[batch] {
            WorkerMessage::ConsoleBatch { logs, .. } => {
                assert_eq!(logs.len(), 1);
                assert_eq!(logs[0].level, ConsoleLevel::Warn);
                assert_eq!(logs[0].count, 3);
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_terminate_stops_a_runaway_task() {
        let mut worker = Worker::spawn(WorkerConfig::default()).unwrap();
        let handle = worker.handle();
        worker
            .send(HostMessage::Start {
                runs: vec![RunRequest::new("spin", "return function run() { for (;;) {} };")],
                options: quick_options(1),
            })
            .unwrap();

        loop {
            match worker.recv().await {
                Some(WorkerMessage::Setup { .. }) => break,
                Some(_) => continue,
                None => panic!("worker closed before setup"),
            }
        }
        handle.terminate();
        assert!(worker.is_terminated());
        assert_eq!(
            handle.send(HostMessage::Start {
                runs: Vec::new(),
                options: quick_options(1),
            }),
            Err(IsolationError::Terminated(handle.id()))
        );

        worker.terminate();
        while let Some(message) = worker.recv().await {
            assert!(!message.is_terminal(), "unexpected {:?}", message);
        }
    }
}
