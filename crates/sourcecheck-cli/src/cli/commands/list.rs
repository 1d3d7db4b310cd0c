//! `sourcecheck list` – show stored sources.

use anyhow::Result;
use sourcecheck_core::annotate;
use sourcecheck_core::store::SourceDb;

pub async fn run_list(db: &SourceDb, group: Option<&str>) -> Result<()> {
    let sources: Vec<_> = db
        .list_sources()
        .await?
        .into_iter()
        .filter(|s| group.map_or(true, |g| annotate::has_group(s.group.as_deref(), g)))
        .collect();
    if sources.is_empty() {
        println!("No sources in database.");
        return Ok(());
    }
    println!("{:<8} {:<8} {:<24} {:<20} {}", "ENABLED", "RESP_MS", "NAME", "GROUPS", "URL");
    for s in sources {
        println!(
            "{:<8} {:<8} {:<24} {:<20} {}",
            if s.enabled { "yes" } else { "no" },
            s.respond_time_ms,
            s.name,
            s.group.as_deref().unwrap_or("-"),
            s.url
        );
    }
    Ok(())
}
