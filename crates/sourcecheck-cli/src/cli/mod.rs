//! CLI for sourcecheck.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sourcecheck_core::config;
use sourcecheck_core::store::SourceDb;
use std::path::PathBuf;

use commands::{run_check, run_import, run_list, run_remove, run_stop};

/// Top-level CLI for the source checker.
#[derive(Debug, Parser)]
#[command(name = "sourcecheck")]
#[command(about = "sourcecheck: concurrent liveness checks for content-source definitions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Import source definitions from a JSON file (array or single record).
    Import {
        /// Path to the JSON file.
        path: PathBuf,
    },

    /// List stored sources.
    List {
        /// Only sources carrying this group tag.
        #[arg(long)]
        group: Option<String>,
    },

    /// Check sources and tag the broken ones.
    Check {
        /// Source URLs to check. Defaults to every enabled source.
        ids: Vec<String>,
        /// Check only enabled sources carrying this group tag (ignored when URLs are given).
        #[arg(long)]
        group: Option<String>,
        /// Concurrent checks (overrides thread_count from config).
        #[arg(long, value_name = "N")]
        threads: Option<usize>,
    },

    /// Stop a running `sourcecheck check`.
    Stop,

    /// Remove a source by URL.
    Remove {
        /// Source URL.
        url: String,
    },
}

async fn open_db() -> Result<SourceDb> {
    SourceDb::open_default().await
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Import { path } => run_import(&open_db().await?, &path).await?,
            CliCommand::List { group } => run_list(&open_db().await?, group.as_deref()).await?,
            CliCommand::Check {
                ids,
                group,
                threads,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_check(&open_db().await?, &cfg, ids, group.as_deref(), threads).await?;
            }
            CliCommand::Stop => run_stop().await?,
            CliCommand::Remove { url } => run_remove(&open_db().await?, &url).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
