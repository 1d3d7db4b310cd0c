//! Source records and the values that flow through the fetch pipeline.
//!
//! `Source` reads and writes the common JSON export format for source
//! definitions, so a record imported from a file and written back keeps every
//! key, including the rule configuration only pipelines understand.

mod explore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use explore::{parse_explore_kinds, ExploreKind};

/// Response time recorded before a source has ever been measured (ms).
pub const DEFAULT_RESPOND_TIME_MS: i64 = 180_000;

fn default_respond_time() -> i64 {
    DEFAULT_RESPOND_TIME_MS
}

fn default_enabled() -> bool {
    true
}

/// A remote content-source definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Unique key; the source's base URL.
    #[serde(rename = "bookSourceUrl")]
    pub url: String,
    #[serde(rename = "bookSourceName", default)]
    pub name: String,
    /// Comma-joined group tags.
    #[serde(rename = "bookSourceGroup", default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(rename = "bookSourceComment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Last measured response time in milliseconds.
    #[serde(rename = "respondTime", default = "default_respond_time")]
    pub respond_time_ms: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,
    /// Raw explore definition; see [`parse_explore_kinds`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explore_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_search: Option<SearchRule>,
    /// Everything else in the record (site rules, headers, ...).
    #[serde(flatten)]
    pub rules: Map<String, Value>,
}

/// Search rule block. Only the check keyword matters here; the rest is kept opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRule {
    #[serde(rename = "checkKeyWord", default, skip_serializing_if = "Option::is_none")]
    pub check_keyword: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Source {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            group: None,
            comment: None,
            respond_time_ms: DEFAULT_RESPOND_TIME_MS,
            enabled: true,
            search_url: None,
            explore_url: None,
            rule_search: None,
            rules: Map::new(),
        }
    }

    /// Per-source search keyword, if set and non-blank.
    pub fn check_keyword(&self) -> Option<&str> {
        self.rule_search
            .as_ref()
            .and_then(|r| r.check_keyword.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    /// Explore entries in declared order.
    pub fn explore_kinds(&self) -> Vec<ExploreKind> {
        self.explore_url
            .as_deref()
            .map(parse_explore_kinds)
            .unwrap_or_default()
    }

    /// First explore entry with a non-blank URL.
    pub fn first_explore_url(&self) -> Option<String> {
        self.explore_kinds()
            .into_iter()
            .filter_map(|k| k.url)
            .find(|u| !u.trim().is_empty())
    }
}

/// One hit from a search or explore step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    #[serde(default)]
    pub author: String,
    pub book_url: String,
    #[serde(default)]
    pub toc_url: Option<String>,
}

impl SearchResult {
    pub fn into_item(self) -> Item {
        Item {
            name: self.name,
            author: self.author,
            book_url: self.book_url,
            toc_url: self.toc_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

/// A work (book) resolved from a search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub author: String,
    pub book_url: String,
    pub toc_url: Option<String>,
}

impl Item {
    /// True once the detail step (or the search result) supplied a toc URL.
    pub fn has_toc_url(&self) -> bool {
        self.toc_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// One entry of a table of contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub url: String,
    /// Structural placeholder (volume heading) with no content of its own.
    #[serde(default)]
    pub is_volume: bool,
}
