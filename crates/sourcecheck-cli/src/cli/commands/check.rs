//! `sourcecheck check` – run a check over a batch of sources.

use anyhow::Result;
use sourcecheck_core::annotate;
use sourcecheck_core::check::CheckDeps;
use sourcecheck_core::config::CheckConfig;
use sourcecheck_core::control::{self, RunControl};
use sourcecheck_core::diagnostics::CheckLog;
use sourcecheck_core::pipeline::HttpPipeline;
use sourcecheck_core::scheduler::{CheckEvent, RunStart, SourceChecker};
use sourcecheck_core::store::SourceDb;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::control_socket;

pub async fn run_check(
    db: &SourceDb,
    cfg: &CheckConfig,
    ids: Vec<String>,
    group: Option<&str>,
    threads: Option<usize>,
) -> Result<()> {
    let ids = if ids.is_empty() {
        db.list_ids(group).await?
    } else {
        ids
    };
    if ids.is_empty() {
        println!("No sources to check.");
        return Ok(());
    }

    let mut cfg = cfg.clone();
    if let Some(n) = threads {
        cfg.thread_count = n;
    }
    let checker = SourceChecker::new(CheckDeps {
        store: Arc::new(db.clone()),
        pipeline: Arc::new(HttpPipeline::default()),
        recorder: Arc::new(CheckLog::new(cfg.timeout())),
        cfg: cfg.clone(),
    });

    let run_control = RunControl::new();
    let socket_path = control::default_control_socket_path().ok();
    let listener = socket_path.as_ref().and_then(|path| {
        match control_socket::spawn_control_listener(run_control.clone(), path) {
            Ok(handle) => {
                tracing::debug!(path = %path.display(), "control socket listening");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "control socket unavailable: {:#}", e);
                None
            }
        }
    });
    let ctrl_c = {
        let run_control = run_control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                run_control.request_stop();
            }
        })
    };

    let mut events = checker.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CheckEvent::Progress(p)) => println!("  {}", p.message()),
                Ok(CheckEvent::Rejected) => println!("A check is already running."),
                Ok(CheckEvent::Done) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(n)) => tracing::debug!("progress printer skipped {} event(s)", n),
            }
        }
    });

    let handle = match checker.start_run(ids.clone()) {
        RunStart::Accepted(handle) => handle,
        RunStart::Rejected => {
            printer.abort();
            return Ok(());
        }
    };
    let stopper = {
        let checker = checker.clone();
        let run_control = run_control.clone();
        tokio::spawn(async move {
            run_control.stopped().await;
            checker.stop_run();
        })
    };

    let summary = handle.wait().await;
    stopper.abort();
    ctrl_c.abort();
    let _ = printer.await;
    if let Some(listener) = listener {
        listener.abort();
    }
    if let Some(path) = socket_path {
        let _ = std::fs::remove_file(path);
    }

    let mut broken = Vec::new();
    for id in &ids {
        if let Some(source) = db.get_source(id).await? {
            if annotate::has_group(source.group.as_deref(), &cfg.broken_group) {
                broken.push(source);
            }
        }
    }

    println!(
        "Checked {}/{} source(s){}; {} broken",
        summary.completed,
        summary.total,
        if summary.cancelled { " (stopped)" } else { "" },
        broken.len()
    );
    for source in broken {
        let reason = source
            .comment
            .as_deref()
            .and_then(|c| c.lines().next())
            .unwrap_or("");
        println!("  {:<24} {}  {}", source.name, source.url, reason);
    }
    Ok(())
}
