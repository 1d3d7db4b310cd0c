//! `sourcecheck import <file>` – import source definitions.

use anyhow::{Context, Result};
use sourcecheck_core::store::SourceDb;
use std::path::Path;

pub async fn run_import(db: &SourceDb, path: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let n = db.import_json(&text).await?;
    println!("Imported {n} source(s) from {}", path.display());
    Ok(())
}
