//! `sourcecheck remove <url>` – delete a source.

use anyhow::Result;
use sourcecheck_core::store::SourceDb;

pub async fn run_remove(db: &SourceDb, url: &str) -> Result<()> {
    if db.remove_source(url).await? {
        println!("Removed {url}");
    } else {
        println!("No source {url}");
    }
    Ok(())
}
