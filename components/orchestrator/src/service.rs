//! Benchmark batches
//!
//! [`BenchmarkService::run_benchmark`] builds every implementation
//! concurrently, then hands the whole batch to one fresh worker. A background
//! task pumps worker messages into the [`BenchmarkStore`] until every run has
//! settled; the call itself resolves with the results, or rejects on the
//! first failure while the remaining runs keep updating the store.
//!
//! At most one worker is alive. Starting a batch terminates the previous
//! one, and [`BenchmarkService::stop_benchmark`] terminates the batch a run
//! belongs to. A batch whose runs are superseded by newer runs of the same
//! implementations is terminated as soon as the new runs are added, before
//! they are built.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use code_processor::{process_implementation, ModuleLoader, ProcessError};
use core_types::{BenchmarkOptions, BenchmarkResult, FailureKind, Implementation, Library};
use futures::future;
use isolation::{HostMessage, RunRequest, Worker, WorkerConfig, WorkerHandle, WorkerMessage};
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::run::{BenchmarkRun, SIBLING_FAILURE_MESSAGE};
use crate::store::BenchmarkStore;

struct ActiveBatch {
    id: u64,
    run_ids: Vec<String>,
    worker: WorkerHandle,
    stopped: Arc<Notify>,
}

impl ActiveBatch {
    fn shut_down(&self, store: &BenchmarkStore) {
        self.worker.terminate();
        self.stopped.notify_one();
        let cancelled = store.cancel_runs(&self.run_ids);
        info!(batch = self.id, cancelled, "benchmark batch stopped");
    }
}

/// Runs benchmark batches and keeps the store up to date
#[derive(Clone)]
pub struct BenchmarkService {
    store: Arc<BenchmarkStore>,
    loader: Arc<dyn ModuleLoader>,
    libraries: Vec<Library>,
    worker_config: WorkerConfig,
    active: Arc<Mutex<Option<ActiveBatch>>>,
    next_batch: Arc<AtomicU64>,
}

impl BenchmarkService {
    /// Service resolving network imports through `loader`
    pub fn new(store: Arc<BenchmarkStore>, loader: Arc<dyn ModuleLoader>) -> Self {
        BenchmarkService {
            store,
            loader,
            libraries: Vec::new(),
            worker_config: WorkerConfig::default(),
            active: Arc::new(Mutex::new(None)),
            next_batch: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Packages the benchmark code may import by name
    pub fn with_libraries(mut self, libraries: Vec<Library>) -> Self {
        self.libraries = libraries;
        self
    }

    /// Worker settings for every batch
    pub fn with_worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker_config = config;
        self
    }

    /// The store this service writes to
    pub fn store(&self) -> &Arc<BenchmarkStore> {
        &self.store
    }

    /// Configured libraries
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// True while a worker is measuring a batch
    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Measure every implementation against a shared setup module.
    ///
    /// Results come back in implementation order.
    pub async fn run_benchmark(
        &self,
        setup: &str,
        implementations: &[Implementation],
        options: BenchmarkOptions,
    ) -> Result<Vec<BenchmarkResult>> {
        info!(
            setup_bytes = setup.len(),
            implementations = implementations.len(),
            "starting benchmark"
        );
        let runs: Vec<BenchmarkRun> = implementations.iter().map(BenchmarkRun::new).collect();
        let run_ids: Vec<String> = runs.iter().map(|run| run.id.clone()).collect();
        let superseded = self.store.add_runs(runs.clone());
        self.supersede(&superseded);

        let processed = future::join_all(runs.iter().map(|run| {
            process_implementation(setup, &run.original_code, &self.libraries, self.loader.clone())
        }))
        .await;
        if processed.iter().any(|outcome| outcome.is_err()) {
            return Err(self.fail_batch(&run_ids, processed));
        }
        let codes: Vec<String> = processed.into_iter().filter_map(|outcome| outcome.ok()).collect();

        for (id, code) in run_ids.iter().zip(&codes) {
            self.store.update_run(id, |run| run.set_processed_code(code.clone()));
        }
        let stopped_early = run_ids
            .iter()
            .any(|id| self.store.run(id).map_or(true, |run| run.status.is_terminal()));
        if stopped_early {
            self.store.cancel_runs(&run_ids);
            info!("benchmark stopped before execution");
            return Err(OrchestratorError::Cancelled);
        }

        let (worker, batch) = self.start_batch(&run_ids)?;
        let requests = run_ids
            .iter()
            .zip(codes)
            .map(|(id, code)| RunRequest::new(id.clone(), code))
            .collect();
        if let Err(err) = worker.send(HostMessage::Start {
            runs: requests,
            options,
        }) {
            self.store.cancel_runs(&run_ids);
            return Err(err.into());
        }

        let (settle, settled) = oneshot::channel();
        tokio::spawn(drive_batch(
            worker,
            batch,
            run_ids,
            self.store.clone(),
            self.active.clone(),
            settle,
        ));
        settled.await.unwrap_or(Err(OrchestratorError::WorkerLost))
    }

    /// Terminate the batch `run_id` belongs to and cancel its runs.
    ///
    /// A run that is still being built is cancelled on its own and its batch
    /// is abandoned before a worker starts. Returns false if nothing was
    /// stopped.
    pub fn stop_benchmark(&self, run_id: &str) -> bool {
        let batch = {
            let mut active = self.active.lock();
            match active.as_ref() {
                Some(batch) if batch.run_ids.iter().any(|id| id == run_id) => active.take(),
                _ => None,
            }
        };
        match batch {
            Some(batch) => {
                batch.shut_down(&self.store);
                true
            }
            None => matches!(self.store.update_run(run_id, BenchmarkRun::cancel), Some(Ok(_))),
        }
    }

    /// Terminate the active batch if any of `run_ids` belong to it
    fn supersede(&self, run_ids: &[String]) {
        if run_ids.is_empty() {
            return;
        }
        let batch = {
            let mut active = self.active.lock();
            match active.as_ref() {
                Some(batch) if batch.run_ids.iter().any(|id| run_ids.contains(id)) => active.take(),
                _ => None,
            }
        };
        if let Some(batch) = batch {
            debug!(batch = batch.id, "runs superseded by a new batch");
            batch.shut_down(&self.store);
        }
    }

    fn fail_batch(
        &self,
        run_ids: &[String],
        outcomes: Vec<std::result::Result<String, ProcessError>>,
    ) -> OrchestratorError {
        let total = outcomes.len();
        let mut first: Option<(String, FailureKind)> = None;
        let mut failed = 0;
        for (id, outcome) in run_ids.iter().zip(outcomes) {
            match outcome {
                Ok(_) => {
                    self.store
                        .update_run(id, |run| run.fail(SIBLING_FAILURE_MESSAGE, FailureKind::Cancelled));
                }
                Err(err) => {
                    failed += 1;
                    let message = err.to_string();
                    warn!(run_id = %id, kind = %err.kind(), error = %message, "failed to build implementation");
                    self.store.update_run(id, |run| run.fail(message.as_str(), err.kind()));
                    first.get_or_insert((message, err.kind()));
                }
            }
        }
        let (message, kind) = first.unwrap_or_else(|| (String::new(), FailureKind::InvalidCode));
        OrchestratorError::Preprocessing {
            failed,
            total,
            message,
            kind,
        }
    }

    fn start_batch(&self, run_ids: &[String]) -> Result<(Worker, BatchToken)> {
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            debug!(batch = previous.id, "superseding previous batch");
            previous.shut_down(&self.store);
        }
        let worker = Worker::spawn(self.worker_config.clone())?;
        let token = BatchToken {
            id: self.next_batch.fetch_add(1, Ordering::SeqCst),
            stopped: Arc::new(Notify::new()),
        };
        *active = Some(ActiveBatch {
            id: token.id,
            run_ids: run_ids.to_vec(),
            worker: worker.handle(),
            stopped: token.stopped.clone(),
        });
        info!(batch = token.id, worker = worker.id(), runs = run_ids.len(), "batch dispatched");
        Ok((worker, token))
    }
}

struct BatchToken {
    id: u64,
    stopped: Arc<Notify>,
}

async fn drive_batch(
    mut worker: Worker,
    batch: BatchToken,
    run_ids: Vec<String>,
    store: Arc<BenchmarkStore>,
    active: Arc<Mutex<Option<ActiveBatch>>>,
    settle: oneshot::Sender<Result<Vec<BenchmarkResult>>>,
) {
    let mut pending: HashSet<String> = run_ids.iter().cloned().collect();
    let mut results: HashMap<String, BenchmarkResult> = HashMap::new();
    let mut settle = Some(settle);
    let mut refused = false;

    while !pending.is_empty() {
        let message = tokio::select! {
            message = worker.recv() => message,
            _ = batch.stopped.notified() => None,
        };
        let Some(message) = message else { break };
        if worker.is_terminated() {
            break;
        }
        let run_id = message.run_id().to_string();
        if !pending.contains(&run_id) {
            debug!(run_id = %run_id, message = message.name(), "ignored message for settled run");
            continue;
        }
        let applied = store.apply(&message);
        match message {
            WorkerMessage::Result { .. } | WorkerMessage::Error { .. } if !applied => {
                // The run was cancelled while the worker was still measuring it
                pending.remove(&run_id);
                refused = true;
                debug!(run_id = %run_id, message = message.name(), "discarded outcome of a cancelled run");
                if let Some(settle) = settle.take() {
                    let _ = settle.send(Err(OrchestratorError::Cancelled));
                }
            }
            WorkerMessage::Result { result, .. } => {
                pending.remove(&run_id);
                results.insert(run_id, result);
            }
            WorkerMessage::Error { error, kind, .. } => {
                pending.remove(&run_id);
                warn!(run_id = %run_id, kind = %kind, error = %error, "run failed");
                let outcome = if kind == FailureKind::Cancelled {
                    Err(OrchestratorError::Cancelled)
                } else {
                    Err(OrchestratorError::Execution {
                        run_id,
                        message: error,
                    })
                };
                if let Some(settle) = settle.take() {
                    let _ = settle.send(outcome);
                }
            }
            _ => {}
        }
    }

    let unfinished: Vec<String> = run_ids
        .iter()
        .filter(|id| pending.contains(*id))
        .cloned()
        .collect();
    let outcome = if refused {
        store.cancel_runs(&unfinished);
        Err(OrchestratorError::Cancelled)
    } else if unfinished.is_empty() {
        Ok(run_ids.iter().filter_map(|id| results.remove(id)).collect())
    } else if worker.is_terminated() {
        store.cancel_runs(&unfinished);
        Err(OrchestratorError::Cancelled)
    } else {
        store.fail_runs(
            &unfinished,
            "The worker exited before the run finished",
            FailureKind::ExecutionError,
        );
        Err(OrchestratorError::WorkerLost)
    };

    {
        let mut active = active.lock();
        if active.as_ref().is_some_and(|current| current.id == batch.id) {
            *active = None;
        }
    }
    debug!(batch = batch.id, "batch settled");
    if let Some(settle) = settle.take() {
        let _ = settle.send(outcome);
    }
}
