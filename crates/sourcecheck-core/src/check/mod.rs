//! Validation of a single source.
//!
//! Drives one source through search (or the explore fallback), book detail,
//! table of contents and a probe chapter, then writes the verdict back onto
//! the record as group tags and a comment block:
//! Started → Searching → (Exploring) → FetchingInfo → FetchingToc →
//! FetchingContent → Succeeded | Failed | TimedOut.

mod error;
mod task;

use std::sync::Arc;
use std::time::Duration;

use crate::config::CheckConfig;
use crate::diagnostics::CheckRecorder;
use crate::pipeline::FetchPipeline;
use crate::store::SourceStore;

pub use error::CheckError;
pub use task::check_source;

/// Collaborators shared by every task of a run.
pub struct CheckDeps {
    pub store: Arc<dyn SourceStore>,
    pub pipeline: Arc<dyn FetchPipeline>,
    pub recorder: Arc<dyn CheckRecorder>,
    pub cfg: CheckConfig,
}

/// Step a task is currently in; reported through `tracing` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    Started,
    Searching,
    Exploring,
    FetchingInfo,
    FetchingToc,
    FetchingContent,
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Succeeded,
    Failed(String),
    TimedOut(Duration),
}

impl CheckOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckOutcome::Succeeded)
    }

    /// Failure message as written into the comment; None on success.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            CheckOutcome::Succeeded => None,
            CheckOutcome::Failed(msg) => Some(msg.clone()),
            CheckOutcome::TimedOut(d) => Some(CheckError::Timeout(*d).to_string()),
        }
    }
}

/// Result of one task after the record has been written back.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub url: String,
    pub name: String,
    pub outcome: CheckOutcome,
    pub respond_time: Duration,
}
