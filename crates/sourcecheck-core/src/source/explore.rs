//! Parsing of the explore definition attached to a source.
//!
//! Two encodings are in use: a JSON array of `{"title", "url"}` objects, or a
//! plain list of `title::url` entries separated by `&&` or newlines.

use serde::{Deserialize, Serialize};

/// One explore (discovery) entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExploreKind {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Parses an explore definition. Malformed JSON yields no entries.
pub fn parse_explore_kinds(raw: &str) -> Vec<ExploreKind> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if raw.starts_with('[') {
        return match serde_json::from_str::<Vec<ExploreKind>>(raw) {
            Ok(kinds) => kinds,
            Err(e) => {
                tracing::debug!("explore definition is not valid JSON: {}", e);
                Vec::new()
            }
        };
    }
    raw.split("&&")
        .flat_map(|part| part.split('\n'))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once("::") {
            Some((title, url)) => ExploreKind {
                title: title.trim().to_string(),
                url: Some(url.trim().to_string()),
            },
            None => ExploreKind {
                title: entry.to_string(),
                url: None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_entries_in_declared_order() {
        let kinds = parse_explore_kinds("Hot::/hot&&New::/new\nTop::/top");
        let urls: Vec<_> = kinds.iter().map(|k| k.url.as_deref().unwrap()).collect();
        assert_eq!(urls, vec!["/hot", "/new", "/top"]);
        assert_eq!(kinds[0].title, "Hot");
    }

    #[test]
    fn entry_without_separator_has_no_url() {
        let kinds = parse_explore_kinds("Section\nHot::/hot");
        assert_eq!(kinds[0].url, None);
        assert_eq!(kinds[1].url.as_deref(), Some("/hot"));
    }

    #[test]
    fn json_array_form() {
        let kinds = parse_explore_kinds(
            r#"[{"title": "Head"}, {"title": "Hot", "url": "/hot", "style": {}}]"#,
        );
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[0].url, None);
        assert_eq!(kinds[1].url.as_deref(), Some("/hot"));
    }

    #[test]
    fn malformed_json_yields_nothing() {
        assert!(parse_explore_kinds("[{").is_empty());
        assert!(parse_explore_kinds("   ").is_empty());
    }
}
