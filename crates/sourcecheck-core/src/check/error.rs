use std::time::Duration;
use thiserror::Error;

/// Why a source failed validation.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("empty search result and no explore entry")]
    EmptySearchNoExplore,
    #[error("empty explore result")]
    EmptyExplore,
    #[error("empty table of contents")]
    EmptyToc,
    #[error("empty chapter content")]
    EmptyContent,
    #[error("check timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// A pipeline step failed; its message is kept as is.
    #[error("{0:#}")]
    Pipeline(#[from] anyhow::Error),
}
