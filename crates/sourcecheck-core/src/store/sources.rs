//! Source record operations: import, upsert, get, list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;

use super::db::{unix_timestamp, SourceDb};
use super::SourceStore;
use crate::annotate;
use crate::source::Source;

/// Listing view used by the CLI.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub url: String,
    pub name: String,
    pub group: Option<String>,
    pub respond_time_ms: i64,
    pub enabled: bool,
}

impl SourceDb {
    /// Insert or replace a source record.
    pub async fn upsert(&self, source: &Source) -> Result<()> {
        let json = serde_json::to_string(source)?;
        sqlx::query(
            r#"
            INSERT INTO sources (
                url, name, group_tags, comment, respond_time, enabled, source_json, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(url) DO UPDATE SET
                name = excluded.name,
                group_tags = excluded.group_tags,
                comment = excluded.comment,
                respond_time = excluded.respond_time,
                enabled = excluded.enabled,
                source_json = excluded.source_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&source.url)
        .bind(&source.name)
        .bind(&source.group)
        .bind(&source.comment)
        .bind(source.respond_time_ms)
        .bind(source.enabled)
        .bind(json)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Import a JSON array of source records (or a single record). Returns
    /// the number of records stored; existing records with the same URL are
    /// replaced.
    pub async fn import_json(&self, text: &str) -> Result<usize> {
        let value: serde_json::Value =
            serde_json::from_str(text).context("source file is not valid JSON")?;
        let sources: Vec<Source> = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)?,
            other => vec![serde_json::from_value(other)?],
        };
        let mut stored = 0;
        for source in &sources {
            if source.url.trim().is_empty() {
                tracing::warn!(name = %source.name, "skipping source without URL");
                continue;
            }
            self.upsert(source).await?;
            stored += 1;
        }
        Ok(stored)
    }

    /// Fetch a single source record.
    pub async fn get_source(&self, url: &str) -> Result<Option<Source>> {
        let row = sqlx::query(r#"SELECT source_json FROM sources WHERE url = ?1"#)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let json: String = row.get("source_json");
        let source = serde_json::from_str(&json)
            .with_context(|| format!("decode stored source {}", url))?;
        Ok(Some(source))
    }

    /// List all sources, ordered by name then URL.
    pub async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT url, name, group_tags, respond_time, enabled
            FROM sources
            ORDER BY name ASC, url ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(SourceSummary {
                url: row.get("url"),
                name: row.get("name"),
                group: row.get("group_tags"),
                respond_time_ms: row.get("respond_time"),
                enabled: row.get("enabled"),
            });
        }
        Ok(out)
    }

    /// URLs of enabled sources, optionally restricted to those carrying `group`.
    pub async fn list_ids(&self, group: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .list_sources()
            .await?
            .into_iter()
            .filter(|s| s.enabled)
            .filter(|s| group.map_or(true, |g| annotate::has_group(s.group.as_deref(), g)))
            .map(|s| s.url)
            .collect())
    }

    /// Remove a source. Returns false if it did not exist.
    pub async fn remove_source(&self, url: &str) -> Result<bool> {
        let res = sqlx::query(r#"DELETE FROM sources WHERE url = ?1"#)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl SourceStore for SourceDb {
    async fn get(&self, url: &str) -> Result<Option<Source>> {
        self.get_source(url).await
    }

    async fn update(&self, source: &Source) -> Result<()> {
        self.upsert(source).await
    }
}
