//! Observable benchmark state
//!
//! The store keeps every run ever created (append-only, most recent last per
//! implementation), the console output and chart series of each run, and
//! broadcasts a [`StoreEvent`] for every change.

use std::collections::HashMap;

use core_types::{ConsoleLog, FailureKind};
use isolation::WorkerMessage;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::TransitionError;
use crate::run::{BenchmarkRun, ChartDataPoint, ConsoleLogEntry};

const EVENT_CAPACITY: usize = 1024;

/// A change to the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A run was created
    RunAdded(BenchmarkRun),
    /// A run changed; carries the new state
    RunUpdated(BenchmarkRun),
    /// Console output was appended to a run, already coalesced
    Console {
        /// Run id
        run_id: String,
        /// The run's full console after the append
        entries: Vec<ConsoleLogEntry>,
    },
    /// A chart point was recorded
    ChartPoint {
        /// Run id
        run_id: String,
        /// New point
        point: ChartDataPoint,
    },
    /// A run's chart series was dropped
    ChartCleared {
        /// Run id
        run_id: String,
    },
}

#[derive(Default)]
struct StoreState {
    runs: Vec<BenchmarkRun>,
    console: HashMap<String, Vec<ConsoleLogEntry>>,
    charts: HashMap<String, Vec<ChartDataPoint>>,
}

impl StoreState {
    fn run_mut(&mut self, id: &str) -> Option<&mut BenchmarkRun> {
        self.runs.iter_mut().find(|run| run.id == id)
    }
}

/// Run history shared between the service and its observers
pub struct BenchmarkStore {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for BenchmarkStore {
    fn default() -> Self {
        BenchmarkStore::new()
    }
}

impl BenchmarkStore {
    /// Empty store
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        BenchmarkStore {
            state: RwLock::new(StoreState::default()),
            events,
        }
    }

    /// Receive every later change
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Append new runs, cancelling any still-active run of the same
    /// implementations and dropping their chart series.
    ///
    /// Returns the ids of the runs that were cancelled.
    pub fn add_runs(&self, runs: Vec<BenchmarkRun>) -> Vec<String> {
        let mut updated = Vec::new();
        let mut cleared = Vec::new();
        {
            let mut state = self.state.write();
            for new_run in &runs {
                let mut superseded = Vec::new();
                for run in state
                    .runs
                    .iter_mut()
                    .filter(|run| run.implementation_id == new_run.implementation_id)
                {
                    if !run.status.is_terminal() && run.cancel().is_ok() {
                        updated.push(run.clone());
                    }
                    superseded.push(run.id.clone());
                }
                for id in superseded {
                    if state.charts.remove(&id).is_some() {
                        cleared.push(id);
                    }
                }
            }
            state.runs.extend(runs.iter().cloned());
        }
        let cancelled = updated.iter().map(|run| run.id.clone()).collect();
        for run in updated {
            debug!(run_id = %run.id, "superseded by a new run");
            self.publish(StoreEvent::RunUpdated(run));
        }
        for run_id in cleared {
            self.publish(StoreEvent::ChartCleared { run_id });
        }
        for run in runs {
            self.publish(StoreEvent::RunAdded(run));
        }
        cancelled
    }

    /// Apply a mutation to one run and broadcast the result.
    ///
    /// Returns `None` for an unknown id.
    pub fn update_run<F>(&self, id: &str, mutate: F) -> Option<Result<BenchmarkRun, TransitionError>>
    where
        F: FnOnce(&mut BenchmarkRun) -> Result<(), TransitionError>,
    {
        let outcome = {
            let mut state = self.state.write();
            let run = state.run_mut(id)?;
            mutate(run).map(|()| run.clone())
        };
        match &outcome {
            Ok(run) => self.publish(StoreEvent::RunUpdated(run.clone())),
            Err(err) => debug!(error = %err, "ignored run update"),
        }
        Some(outcome)
    }

    /// Cancel every non-terminal run among `ids`
    pub fn cancel_runs(&self, ids: &[String]) -> usize {
        let mut cancelled = 0;
        for id in ids {
            if self.run(id).is_some_and(|run| !run.status.is_terminal())
                && matches!(self.update_run(id, BenchmarkRun::cancel), Some(Ok(_)))
            {
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Fail every non-terminal run among `ids`
    pub fn fail_runs(&self, ids: &[String], message: &str, kind: FailureKind) {
        for id in ids {
            if self.run(id).is_some_and(|run| !run.status.is_terminal()) {
                self.update_run(id, |run| run.fail(message, kind));
            }
        }
    }

    /// Append console output, merging with the run's last entry when identical
    pub fn append_console(&self, run_id: &str, logs: Vec<ConsoleLog>) {
        let entries = {
            let mut state = self.state.write();
            match state.runs.iter().find(|run| run.id == run_id) {
                Some(run) if !run.status.is_terminal() => {}
                _ => return,
            }
            let console = state.console.entry(run_id.to_string()).or_default();
            for log in logs {
                match console.last_mut() {
                    Some(last) if last.level == log.level && last.message == log.message => {
                        last.count = last.count.saturating_add(log.count);
                    }
                    _ => console.push(ConsoleLogEntry::from_log(log)),
                }
            }
            console.clone()
        };
        self.publish(StoreEvent::Console {
            run_id: run_id.to_string(),
            entries,
        });
    }

    fn push_chart_point(&self, run_id: &str, point: ChartDataPoint) {
        self.state
            .write()
            .charts
            .entry(run_id.to_string())
            .or_default()
            .push(point);
        self.publish(StoreEvent::ChartPoint {
            run_id: run_id.to_string(),
            point,
        });
    }

    /// Fold one worker message into the matching run.
    ///
    /// Returns false when the run refused the message, such as a result
    /// arriving for a run that was already cancelled.
    pub fn apply(&self, message: &WorkerMessage) -> bool {
        let run_id = message.run_id();
        let outcome = match message {
            WorkerMessage::TaskStart { .. }
            | WorkerMessage::Setup { .. }
            | WorkerMessage::Teardown { .. }
            | WorkerMessage::TaskComplete { .. } => {
                debug!(run_id, marker = message.name(), "worker lifecycle");
                return true;
            }
            WorkerMessage::WarmupStart { .. } => self.update_run(run_id, BenchmarkRun::begin_warmup),
            WorkerMessage::WarmupEnd { .. } => self.update_run(run_id, BenchmarkRun::end_warmup),
            WorkerMessage::Progress {
                progress,
                elapsed_time,
                iterations_completed,
                total_iterations,
                ..
            } => {
                let updated = self.update_run(run_id, |run| {
                    run.record_progress(*progress, *elapsed_time, *iterations_completed, *total_iterations)
                });
                if let Some(Ok(_)) = updated {
                    self.push_chart_point(run_id, ChartDataPoint::new(*elapsed_time, *iterations_completed));
                }
                updated
            }
            WorkerMessage::Result { result, .. } => self.update_run(run_id, |run| run.complete(*result)),
            WorkerMessage::Error { error, kind, .. } => {
                if *kind == FailureKind::Cancelled {
                    self.update_run(run_id, BenchmarkRun::cancel)
                } else {
                    self.update_run(run_id, |run| run.fail(error.as_str(), *kind))
                }
            }
            WorkerMessage::ConsoleBatch { logs, .. } => {
                self.append_console(run_id, logs.clone());
                return true;
            }
        };
        matches!(outcome, Some(Ok(_)))
    }

    /// One run
    pub fn run(&self, id: &str) -> Option<BenchmarkRun> {
        self.state.read().runs.iter().find(|run| run.id == id).cloned()
    }

    /// Every run in creation order
    pub fn runs(&self) -> Vec<BenchmarkRun> {
        self.state.read().runs.clone()
    }

    /// Run history of one implementation, most recent last
    pub fn runs_for(&self, implementation_id: &str) -> Vec<BenchmarkRun> {
        self.state
            .read()
            .runs
            .iter()
            .filter(|run| run.implementation_id == implementation_id)
            .cloned()
            .collect()
    }

    /// Most recent run of one implementation
    pub fn latest_run(&self, implementation_id: &str) -> Option<BenchmarkRun> {
        self.state
            .read()
            .runs
            .iter()
            .rev()
            .find(|run| run.implementation_id == implementation_id)
            .cloned()
    }

    /// Ids of runs that have not finished
    pub fn active_run_ids(&self) -> Vec<String> {
        self.state
            .read()
            .runs
            .iter()
            .filter(|run| !run.status.is_terminal())
            .map(|run| run.id.clone())
            .collect()
    }

    /// Console output of a run
    pub fn console(&self, run_id: &str) -> Vec<ConsoleLogEntry> {
        self.state.read().console.get(run_id).cloned().unwrap_or_default()
    }

    /// Chart series of a run
    pub fn chart(&self, run_id: &str) -> Vec<ChartDataPoint> {
        self.state.read().charts.get(run_id).cloned().unwrap_or_default()
    }
}
