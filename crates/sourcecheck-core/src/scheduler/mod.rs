//! Check-run scheduler.
//!
//! Seeds an index-addressed queue of source URLs, runs a bounded pool of
//! workers that each claim the next index and check that source, republishes
//! progress after every completion and tears the run down when the last
//! source completes or a stop is requested. One run at a time.

mod progress;
mod queue;
mod run;

pub use progress::{CheckEvent, CheckProgress};
pub use queue::RunPhase;
pub use run::{worker_count, RunHandle, RunStart, RunSummary, SourceChecker, MAX_WORKERS};
