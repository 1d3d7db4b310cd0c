//! Tests for the source store (in-memory DB helper from db).

use super::db::open_memory;
use super::{SourceDb, SourceStore};
use crate::source::Source;

const EXPORT: &str = r##"[
    {"bookSourceUrl": "https://a.example", "bookSourceName": "Alpha", "bookSourceGroup": "cn,失效"},
    {"bookSourceUrl": "https://b.example", "bookSourceName": "Beta", "enabled": false},
    {"bookSourceUrl": "https://c.example", "bookSourceName": "Gamma", "bookSourceGroup": "cn",
     "ruleToc": {"chapterList": "#list a"}},
    {"bookSourceUrl": "", "bookSourceName": "no url"}
]"##;

#[tokio::test]
async fn import_and_list() {
    let db = open_memory().await.unwrap();
    let n = db.import_json(EXPORT).await.unwrap();
    assert_eq!(n, 3);

    let all = db.list_sources().await.unwrap();
    let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    assert!(!all[1].enabled);
}

#[tokio::test]
async fn list_ids_skips_disabled_and_filters_group() {
    let db = open_memory().await.unwrap();
    db.import_json(EXPORT).await.unwrap();

    let ids = db.list_ids(None).await.unwrap();
    assert_eq!(ids, vec!["https://a.example", "https://c.example"]);

    let broken = db.list_ids(Some("失效")).await.unwrap();
    assert_eq!(broken, vec!["https://a.example"]);
}

#[tokio::test]
async fn update_roundtrips_full_record() {
    let db = open_memory().await.unwrap();
    db.import_json(EXPORT).await.unwrap();

    let mut s = db.get("https://c.example").await.unwrap().unwrap();
    assert!(s.rules.contains_key("ruleToc"));
    s.comment = Some("Error: boom".to_string());
    s.respond_time_ms = 42;
    db.update(&s).await.unwrap();

    let back = db.get("https://c.example").await.unwrap().unwrap();
    assert_eq!(back, s);
    let listed = db.list_sources().await.unwrap();
    assert_eq!(listed[2].respond_time_ms, 42);
}

#[tokio::test]
async fn missing_source_is_none() {
    let db = open_memory().await.unwrap();
    assert!(db.get("https://nope").await.unwrap().is_none());
    assert!(!db.remove_source("https://nope").await.unwrap());
}

#[tokio::test]
async fn single_record_import_and_remove() {
    let db = open_memory().await.unwrap();
    let n = db
        .import_json(r#"{"bookSourceUrl": "https://one", "bookSourceName": "One"}"#)
        .await
        .unwrap();
    assert_eq!(n, 1);
    assert!(db.remove_source("https://one").await.unwrap());
    assert!(db.list_sources().await.unwrap().is_empty());
}

#[tokio::test]
async fn open_at_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested dir").join("sources.db");
    let db = SourceDb::open_at(&path).await.unwrap();
    db.upsert(&Source::new("https://x", "X")).await.unwrap();
    drop(db);

    let reopened = SourceDb::open_at(&path).await.unwrap();
    let s = reopened.get_source("https://x").await.unwrap().unwrap();
    assert_eq!(s.name, "X");
}
