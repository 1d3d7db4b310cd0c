//! Reachability pipeline over libcurl.
//!
//! Each step is a plain GET: a step passes when the endpoint answers 2xx with
//! a non-blank body. Scraping rules are not evaluated, so this pipeline tells
//! live sites from dead ones but not a working rule set from a stale one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::{FetchPipeline, StepContext};
use crate::source::{Chapter, Item, SearchResult, Source};

const USER_AGENT: &str = concat!("sourcecheck/", env!("CARGO_PKG_VERSION"));

/// Response of one GET.
#[derive(Debug, Clone)]
struct Page {
    /// URL after redirects.
    url: String,
    body: String,
}

#[derive(Debug, Clone)]
pub struct HttpPipeline {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for HttpPipeline {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Blocking GET; call from `spawn_blocking`.
fn get(url: &str, connect_timeout: Duration, timeout: Duration) -> Result<Page> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.useragent(USER_AGENT)?;
    easy.accept_encoding("")?;
    easy.connect_timeout(connect_timeout)?;
    easy.timeout(timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer
            .perform()
            .with_context(|| format!("GET {} failed", url))?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }
    let final_url = easy
        .effective_url()?
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string());

    Ok(Page {
        url: final_url,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Drops a trailing `,{options}` block, substitutes template variables and
/// resolves the result against the source URL.
fn resolve_url(base: &str, template: &str, keyword: &str) -> Result<String> {
    let template = match template.find(",{") {
        Some(idx) => &template[..idx],
        None => template,
    };
    let filled = template
        .trim()
        .replace("{{key}}", keyword)
        .replace("{{page}}", "1");
    let base = Url::parse(base).with_context(|| format!("invalid source URL {}", base))?;
    let joined = base
        .join(&filled)
        .with_context(|| format!("invalid URL {}", filled))?;
    Ok(joined.to_string())
}

impl HttpPipeline {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    async fn fetch(&self, ctx: &StepContext, url: String) -> Result<Page> {
        let (connect_timeout, timeout) = (self.connect_timeout, self.timeout);
        let request = tokio::task::spawn_blocking(move || get(&url, connect_timeout, timeout));
        tokio::select! {
            res = request => res.context("fetch task join")?,
            _ = ctx.cancel.cancelled() => anyhow::bail!("cancelled"),
        }
    }

    async fn list_page(&self, ctx: &StepContext, url: String, name: &str) -> Result<Vec<SearchResult>> {
        let page = self.fetch(ctx, url).await?;
        if page.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![SearchResult {
            name: name.to_string(),
            author: String::new(),
            book_url: page.url,
            toc_url: None,
        }])
    }
}

#[async_trait]
impl FetchPipeline for HttpPipeline {
    async fn search(
        &self,
        ctx: &StepContext,
        source: &Source,
        keyword: &str,
    ) -> Result<Vec<SearchResult>> {
        let Some(template) = source.search_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let url = resolve_url(&source.url, template, keyword)?;
        tracing::debug!(source = %source.url, %url, "search");
        self.list_page(ctx, url, keyword).await
    }

    async fn explore(
        &self,
        ctx: &StepContext,
        source: &Source,
        url: &str,
    ) -> Result<Vec<SearchResult>> {
        let url = resolve_url(&source.url, url, "")?;
        tracing::debug!(source = %source.url, %url, "explore");
        self.list_page(ctx, url, &source.name).await
    }

    async fn fetch_info(&self, ctx: &StepContext, _source: &Source, mut item: Item) -> Result<Item> {
        let page = self.fetch(ctx, item.book_url.clone()).await?;
        item.toc_url = Some(page.url);
        Ok(item)
    }

    async fn fetch_toc(
        &self,
        ctx: &StepContext,
        _source: &Source,
        item: &Item,
    ) -> Result<Vec<Chapter>> {
        let toc_url = item
            .toc_url
            .clone()
            .unwrap_or_else(|| item.book_url.clone());
        let page = self.fetch(ctx, toc_url).await?;
        Ok(vec![Chapter {
            title: item.name.clone(),
            url: page.url,
            is_volume: false,
        }])
    }

    async fn fetch_content(
        &self,
        ctx: &StepContext,
        _source: &Source,
        _item: &Item,
        chapter: &Chapter,
        _next_chapter_url: Option<&str>,
        _persist: bool,
    ) -> Result<String> {
        let page = self.fetch(ctx, chapter.url.clone()).await?;
        Ok(page.body)
    }
}
