//! Fetch pipeline seam.
//!
//! A pipeline performs one network-bound step against a source's site: search,
//! explore, book detail, table of contents, chapter content. How a source's
//! scraping rules are interpreted is entirely up to the implementation; the
//! checker only sequences the steps and judges the results.

mod http;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::source::{Chapter, Item, SearchResult, Source};

pub use http::HttpPipeline;

/// Per-task context handed to every pipeline step.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Cancelled when the owning run is stopped.
    pub cancel: CancellationToken,
}

impl StepContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

#[async_trait]
pub trait FetchPipeline: Send + Sync {
    async fn search(
        &self,
        ctx: &StepContext,
        source: &Source,
        keyword: &str,
    ) -> Result<Vec<SearchResult>>;

    async fn explore(
        &self,
        ctx: &StepContext,
        source: &Source,
        url: &str,
    ) -> Result<Vec<SearchResult>>;

    /// Fills in book details; must set `toc_url` on success.
    async fn fetch_info(&self, ctx: &StepContext, source: &Source, item: Item) -> Result<Item>;

    async fn fetch_toc(&self, ctx: &StepContext, source: &Source, item: &Item)
        -> Result<Vec<Chapter>>;

    /// Fetches one chapter's text. `persist = false` means the content is
    /// only probed and must not be cached anywhere.
    async fn fetch_content(
        &self,
        ctx: &StepContext,
        source: &Source,
        item: &Item,
        chapter: &Chapter,
        next_chapter_url: Option<&str>,
        persist: bool,
    ) -> Result<String>;
}
