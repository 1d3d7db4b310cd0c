//! The per-source check: pipeline sequencing, timeout and verdict annotation.

use anyhow::{Context, Result};

use super::{CheckDeps, CheckError, CheckOutcome, CheckPhase, CheckReport};
use crate::annotate;
use crate::config::CheckConfig;
use crate::pipeline::StepContext;
use crate::source::Source;

fn enter(source: &Source, phase: CheckPhase) {
    tracing::trace!(source = %source.url, ?phase, "check phase");
}

/// Search, falling back to the first explore entry, then detail, toc and one
/// probe chapter. Only the search-broken tag is touched here.
async fn probe(deps: &CheckDeps, ctx: &StepContext, source: &mut Source) -> Result<(), CheckError> {
    let keyword = source
        .check_keyword()
        .unwrap_or(deps.cfg.keyword.as_str())
        .to_string();

    enter(source, CheckPhase::Searching);
    let mut results = deps.pipeline.search(ctx, source, &keyword).await?;
    if results.is_empty() {
        source.group = annotate::add_group(source.group.as_deref(), &deps.cfg.search_broken_group);
        let url = source
            .first_explore_url()
            .ok_or(CheckError::EmptySearchNoExplore)?;
        enter(source, CheckPhase::Exploring);
        results = deps.pipeline.explore(ctx, source, &url).await?;
        if results.is_empty() {
            return Err(CheckError::EmptyExplore);
        }
    } else {
        source.group =
            annotate::remove_group(source.group.as_deref(), &deps.cfg.search_broken_group);
    }

    let mut item = results.swap_remove(0).into_item();
    if !item.has_toc_url() {
        enter(source, CheckPhase::FetchingInfo);
        item = deps.pipeline.fetch_info(ctx, source, item).await?;
    }

    enter(source, CheckPhase::FetchingToc);
    let toc = deps.pipeline.fetch_toc(ctx, source, &item).await?;
    let first = toc.first().ok_or(CheckError::EmptyToc)?;
    let next_url = toc.get(1).unwrap_or(first).url.as_str();

    enter(source, CheckPhase::FetchingContent);
    let content = deps
        .pipeline
        .fetch_content(ctx, source, &item, first, Some(next_url), false)
        .await?;
    if !first.is_volume && content.trim().is_empty() {
        return Err(CheckError::EmptyContent);
    }
    Ok(())
}

/// Tags and comment for a failed check. A comment that already carries an
/// error block keeps it; the newest failure is not stacked on top.
fn mark_failed(source: &mut Source, cfg: &CheckConfig, message: &str) {
    source.group = annotate::add_group(source.group.as_deref(), &cfg.broken_group);
    source.comment = annotate::prepend_error(source.comment.as_deref(), message);
}

fn mark_healthy(source: &mut Source, cfg: &CheckConfig) {
    source.group = annotate::remove_group(source.group.as_deref(), &cfg.broken_group);
    source.comment = annotate::strip_errors(source.comment.as_deref());
}

/// Checks one source and persists the annotated record.
///
/// Every pipeline failure, empty result and the timeout end up in the
/// returned outcome; only a failed store write is an `Err`. When the run is
/// stopped while the task is in flight nothing is written.
pub async fn check_source(
    deps: &CheckDeps,
    ctx: &StepContext,
    mut source: Source,
) -> Result<CheckReport> {
    deps.recorder.begin(&source);
    enter(&source, CheckPhase::Started);

    let budget = deps.cfg.timeout();
    let outcome = match tokio::time::timeout(budget, probe(deps, ctx, &mut source)).await {
        Ok(Ok(())) => CheckOutcome::Succeeded,
        Ok(Err(e)) => CheckOutcome::Failed(e.to_string()),
        Err(_) => CheckOutcome::TimedOut(budget),
    };

    match outcome.failure_message() {
        None => {
            mark_healthy(&mut source, &deps.cfg);
            deps.recorder.final_message(&source.url, "ok");
        }
        Some(message) => {
            mark_failed(&mut source, &deps.cfg, &message);
            deps.recorder
                .final_message(&source.url, &format!("failed: {}", message));
        }
    }

    let respond_time = deps.recorder.response_time(&source.url);
    source.respond_time_ms = i64::try_from(respond_time.as_millis()).unwrap_or(i64::MAX);

    if ctx.cancel.is_cancelled() {
        tracing::debug!(source = %source.url, "run stopped; result not saved");
    } else {
        deps.store
            .update(&source)
            .await
            .with_context(|| format!("save source {}", source.url))?;
    }

    Ok(CheckReport {
        url: source.url,
        name: source.name,
        outcome,
        respond_time,
    })
}
