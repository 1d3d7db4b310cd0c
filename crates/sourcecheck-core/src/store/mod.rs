//! Persistent source store (SQLite via sqlx).
//!
//! Holds every source record together with its group tags, comment and last
//! response time. The checker reads a record at task start and writes it back
//! once at task end.

mod db;
mod sources;

use anyhow::Result;
use async_trait::async_trait;

use crate::source::Source;

pub use db::SourceDb;
pub use sources::SourceSummary;

/// Keyed lookup and update of source records.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn get(&self, url: &str) -> Result<Option<Source>>;

    async fn update(&self, source: &Source) -> Result<()>;
}

#[cfg(test)]
mod tests;
