//! Run lifecycle: accept or reject a batch, spawn the worker pool, publish
//! progress, and tear down on completion or stop.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use super::progress::CheckEvent;
use super::queue::{RunPhase, RunState};
use crate::check::{self, CheckDeps};
use crate::pipeline::StepContext;

/// Hard cap on workers per run, whatever the configured thread count.
pub const MAX_WORKERS: usize = 64;

const EVENT_CAPACITY: usize = 1024;

/// Pool size for a batch: never more workers than sources.
pub fn worker_count(batch: usize, thread_count: usize) -> usize {
    batch.min(thread_count.max(1)).min(MAX_WORKERS)
}

/// Drops repeated URLs, keeping first-seen order: one task per source.
fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    let before = ids.len();
    let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
    if ids.len() < before {
        tracing::debug!(dropped = before - ids.len(), "duplicate sources dropped from batch");
    }
    ids
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub cancelled: bool,
}

/// Answer to [`SourceChecker::start_run`].
#[derive(Debug)]
pub enum RunStart {
    Accepted(RunHandle),
    /// Another run is still in progress; nothing was started.
    Rejected,
}

/// Handle to an accepted run.
#[derive(Debug)]
pub struct RunHandle {
    finished: oneshot::Receiver<RunSummary>,
    pool: JoinHandle<()>,
}

impl RunHandle {
    /// Waits until the run has completed or been stopped and every worker
    /// has exited.
    pub async fn wait(self) -> RunSummary {
        let summary = self.finished.await.unwrap_or(RunSummary {
            total: 0,
            completed: 0,
            cancelled: true,
        });
        if let Err(e) = self.pool.await {
            tracing::error!("check pool join: {}", e);
        }
        summary
    }
}

struct Inner {
    deps: CheckDeps,
    state: Mutex<RunState>,
    events: broadcast::Sender<CheckEvent>,
}

/// Validates batches of sources, one run at a time.
#[derive(Clone)]
pub struct SourceChecker {
    inner: Arc<Inner>,
}

impl SourceChecker {
    pub fn new(deps: CheckDeps) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                deps,
                state: Mutex::new(RunState::default()),
                events,
            }),
        }
    }

    /// Progress stream; subscribe before starting a run to see all of it.
    pub fn subscribe(&self) -> broadcast::Receiver<CheckEvent> {
        self.inner.events.subscribe()
    }

    pub fn phase(&self) -> RunPhase {
        self.lock().phase()
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: CheckEvent) {
        // No listener is fine.
        let _ = self.inner.events.send(event);
    }

    /// Starts checking `ids`. Must be called from within a tokio runtime.
    ///
    /// Rejected while any URL of a previous run has not completed.
    pub fn start_run(&self, ids: Vec<String>) -> RunStart {
        let mut state = self.lock();
        if state.is_busy() {
            tracing::warn!("a source check is already running; try again when it finishes");
            self.publish(CheckEvent::Rejected);
            return RunStart::Rejected;
        }

        let ids = dedup_ids(ids);
        let cancel = CancellationToken::new();
        let (finished_tx, finished_rx) = oneshot::channel();
        let total = ids.len();
        let run_id = state.seed(ids, cancel.clone(), finished_tx);
        let workers = worker_count(total, self.inner.deps.cfg.thread_count);
        tracing::info!(run_id, total, workers, "source check started");
        self.publish(CheckEvent::Progress(state.progress()));
        if total == 0 {
            self.teardown(&mut state, RunPhase::Completed);
        }
        drop(state);

        let pool = tokio::spawn(self.clone().supervise(run_id, workers, cancel));
        RunStart::Accepted(RunHandle {
            finished: finished_rx,
            pool,
        })
    }

    /// Stops the active run. Tasks in flight are abandoned and nothing more
    /// is saved for them. Returns false if no run was active.
    pub fn stop_run(&self) -> bool {
        let mut state = self.lock();
        if state.phase() != RunPhase::Active {
            return false;
        }
        tracing::info!("source check stopped");
        self.teardown(&mut state, RunPhase::Cancelled);
        true
    }

    fn teardown(&self, state: &mut RunState, phase: RunPhase) {
        let summary = state.finish(phase);
        self.inner.deps.recorder.end();
        tracing::info!(
            total = summary.total,
            completed = summary.completed,
            cancelled = summary.cancelled,
            "source check finished"
        );
        self.publish(CheckEvent::Done);
    }

    fn claim_next(&self, run_id: u64) -> Option<(usize, String)> {
        self.lock().claim_next(run_id)
    }

    fn on_task_complete(&self, run_id: u64, url: &str, name: &str) {
        let mut state = self.lock();
        if !state.is_current(run_id) {
            return;
        }
        let progress = state.complete(url, name);
        tracing::debug!(
            source = %url,
            checked = progress.checked,
            total = progress.total,
            "source checked"
        );
        self.publish(CheckEvent::Progress(progress));
        if state.is_finished() {
            self.teardown(&mut state, RunPhase::Completed);
        }
    }

    /// Owns the run's worker pool until every worker has exited.
    async fn supervise(self, run_id: u64, workers: usize, cancel: CancellationToken) {
        let mut pool = JoinSet::new();
        for slot in 0..workers {
            pool.spawn(self.clone().worker(run_id, slot, cancel.clone()));
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    pool.abort_all();
                    while pool.join_next().await.is_some() {}
                    break;
                }
                joined = pool.join_next() => match joined {
                    None => break,
                    Some(Err(e)) if e.is_panic() => {
                        tracing::error!(run_id, "check worker panicked: {}", e);
                    }
                    Some(_) => {}
                },
            }
        }

        // Workers gone but the run never reached its total: close it.
        let mut state = self.lock();
        if state.is_current(run_id) {
            self.teardown(&mut state, RunPhase::Cancelled);
        }
    }

    /// Claims and checks sources until the queue is drained or the run stops.
    async fn worker(self, run_id: u64, slot: usize, cancel: CancellationToken) {
        let ctx = StepContext::new(cancel.clone());
        while let Some((index, url)) = self.claim_next(run_id) {
            tracing::trace!(slot, index, source = %url, "claimed");
            let name = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                name = self.check_one(&ctx, &url) => name,
            };
            self.on_task_complete(run_id, &url, &name);
        }
    }

    /// Display name of the checked source; empty when it is not in the store.
    async fn check_one(&self, ctx: &StepContext, url: &str) -> String {
        let deps = &self.inner.deps;
        let source = match deps.store.get(url).await {
            Ok(Some(source)) => source,
            Ok(None) => {
                tracing::debug!(source = %url, "source not found; skipped");
                return String::new();
            }
            Err(e) => {
                tracing::warn!(source = %url, "load source: {:#}", e);
                return String::new();
            }
        };
        let name = source.name.clone();
        match check::check_source(deps, ctx, source).await {
            Ok(report) => report.name,
            Err(e) => {
                tracing::error!(source = %url, "{:#}", e);
                name
            }
        }
    }
}
