//! Shared run state: the work queue, its claim cursor and the completion list.
//!
//! Always accessed under the scheduler's single mutex; nothing here locks.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::progress::CheckProgress;
use super::run::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Default)]
pub(crate) struct RunState {
    /// Bumped on every seed so workers of an older run can't touch a newer one.
    run_id: u64,
    phase: RunPhase,
    ids: Vec<String>,
    cursor: usize,
    checked: Vec<String>,
    last_name: String,
    cancel: Option<CancellationToken>,
    finished: Option<oneshot::Sender<RunSummary>>,
}

impl RunState {
    /// True while any URL of the current run has not completed.
    pub fn is_busy(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_current(&self, run_id: u64) -> bool {
        self.run_id == run_id && self.phase == RunPhase::Active
    }

    /// Replaces all run state with a fresh queue and returns the new run id.
    pub fn seed(
        &mut self,
        ids: Vec<String>,
        cancel: CancellationToken,
        finished: oneshot::Sender<RunSummary>,
    ) -> u64 {
        self.run_id += 1;
        self.phase = RunPhase::Active;
        self.ids = ids;
        self.cursor = 0;
        self.checked.clear();
        self.last_name.clear();
        self.cancel = Some(cancel);
        self.finished = Some(finished);
        self.run_id
    }

    /// Hands out the next unclaimed index. Each index is returned once per run.
    pub fn claim_next(&mut self, run_id: u64) -> Option<(usize, String)> {
        if !self.is_current(run_id) || self.cursor >= self.ids.len() {
            return None;
        }
        let index = self.cursor;
        self.cursor += 1;
        Some((index, self.ids[index].clone()))
    }

    /// Records a completion and returns the progress to publish.
    pub fn complete(&mut self, url: &str, name: &str) -> CheckProgress {
        self.checked.push(url.to_string());
        self.last_name = name.to_string();
        self.progress()
    }

    pub fn progress(&self) -> CheckProgress {
        CheckProgress {
            name: self.last_name.clone(),
            checked: self.checked.len(),
            total: self.ids.len(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.checked.len() >= self.ids.len()
    }

    /// Ends the current run: cancels its token, clears the queue and hands
    /// the summary to whoever waits on the run.
    pub fn finish(&mut self, phase: RunPhase) -> RunSummary {
        let summary = RunSummary {
            total: self.ids.len(),
            completed: self.checked.len(),
            cancelled: phase == RunPhase::Cancelled,
        };
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(tx) = self.finished.take() {
            let _ = tx.send(summary.clone());
        }
        self.phase = phase;
        self.ids.clear();
        self.cursor = 0;
        self.checked.clear();
        self.last_name.clear();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn seeded(n: usize) -> (RunState, u64, oneshot::Receiver<RunSummary>) {
        let mut state = RunState::default();
        let (tx, rx) = oneshot::channel();
        let ids = (0..n).map(|i| format!("https://s{}", i)).collect();
        let id = state.seed(ids, CancellationToken::new(), tx);
        (state, id, rx)
    }

    #[test]
    fn claims_in_order_then_none() {
        let (mut state, id, _rx) = seeded(2);
        assert_eq!(state.claim_next(id), Some((0, "https://s0".to_string())));
        assert_eq!(state.claim_next(id), Some((1, "https://s1".to_string())));
        assert_eq!(state.claim_next(id), None);
        assert_eq!(state.claim_next(id), None);
    }

    #[test]
    fn concurrent_claims_cover_every_index_once() {
        const M: usize = 500;
        const N: usize = 8;
        let (state, id, _rx) = seeded(M);
        let state = Arc::new(Mutex::new(state));

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    let mut mine = Vec::new();
                    while let Some((index, _)) = state.lock().unwrap().claim_next(id) {
                        mine.push(index);
                    }
                    mine
                })
            })
            .collect();

        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..M).collect::<Vec<_>>());
    }

    #[test]
    fn stale_run_cannot_claim() {
        let (mut state, old, _rx) = seeded(3);
        let (tx, _rx2) = oneshot::channel();
        let new = state.seed(vec!["https://x".into()], CancellationToken::new(), tx);
        assert_ne!(old, new);
        assert_eq!(state.claim_next(old), None);
        assert_eq!(state.claim_next(new), Some((0, "https://x".to_string())));
    }

    #[test]
    fn finish_reports_and_clears() {
        let (mut state, id, mut rx) = seeded(3);
        state.claim_next(id);
        let p = state.complete("https://s0", "zero");
        assert_eq!((p.checked, p.total, p.name.as_str()), (1, 3, "zero"));
        assert!(state.is_busy());
        assert!(!state.is_finished());

        let summary = state.finish(RunPhase::Cancelled);
        assert_eq!(summary.completed, 1);
        assert!(summary.cancelled);
        assert_eq!(rx.try_recv().unwrap(), summary);
        assert!(!state.is_busy());
        assert_eq!(state.phase(), RunPhase::Cancelled);
        assert_eq!(state.claim_next(id), None);
    }
}
