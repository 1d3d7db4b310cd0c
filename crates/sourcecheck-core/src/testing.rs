//! In-memory store, scripted pipeline and recorder used by unit tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::check::CheckDeps;
use crate::config::CheckConfig;
use crate::diagnostics::CheckRecorder;
use crate::pipeline::{FetchPipeline, StepContext};
use crate::source::{Chapter, Item, SearchResult, Source};
use crate::store::SourceStore;

#[derive(Default)]
pub(crate) struct MemoryStore {
    sources: Mutex<HashMap<String, Source>>,
    updates: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn with(sources: impl IntoIterator<Item = Source>) -> Self {
        let store = Self::default();
        {
            let mut map = store.sources.lock().unwrap();
            for s in sources {
                map.insert(s.url.clone(), s);
            }
        }
        store
    }

    pub fn source(&self, url: &str) -> Source {
        self.sources.lock().unwrap()[url].clone()
    }

    pub fn update_count(&self, url: &str) -> usize {
        self.updates.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_updates(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn get(&self, url: &str) -> Result<Option<Source>> {
        Ok(self.sources.lock().unwrap().get(url).cloned())
    }

    async fn update(&self, source: &Source) -> Result<()> {
        self.updates.lock().unwrap().push(source.url.clone());
        self.sources
            .lock()
            .unwrap()
            .insert(source.url.clone(), source.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Search,
    Explore,
    Info,
    Toc,
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub step: Step,
    pub source: String,
    pub arg: String,
}

/// What every step returns; shared by all sources.
#[derive(Debug, Clone)]
pub(crate) struct Script {
    pub search: Vec<SearchResult>,
    pub explore: Vec<SearchResult>,
    pub toc: Vec<Chapter>,
    pub content: String,
    pub fail_at: Option<(Step, String)>,
    pub hang_at: Option<Step>,
    /// Per-source delay applied before every step.
    pub delays: HashMap<String, Duration>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            search: vec![SearchResult {
                name: "book".into(),
                author: "someone".into(),
                book_url: "https://site/book/1".into(),
                toc_url: None,
            }],
            explore: Vec::new(),
            toc: vec![
                Chapter {
                    title: "one".into(),
                    url: "https://site/book/1/c1".into(),
                    is_volume: false,
                },
                Chapter {
                    title: "two".into(),
                    url: "https://site/book/1/c2".into(),
                    is_volume: false,
                },
            ],
            content: "chapter text".into(),
            fail_at: None,
            hang_at: None,
            delays: HashMap::new(),
        }
    }
}

#[derive(Default)]
pub(crate) struct ScriptedPipeline {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedPipeline {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn edit(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, step: Step) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.step == step).collect()
    }

    async fn step(&self, step: Step, source: &Source, arg: &str) -> Result<Script> {
        self.calls.lock().unwrap().push(Call {
            step,
            source: source.url.clone(),
            arg: arg.to_string(),
        });
        let script = self.script.lock().unwrap().clone();
        if let Some(delay) = script.delays.get(&source.url) {
            tokio::time::sleep(*delay).await;
        }
        if script.hang_at == Some(step) {
            std::future::pending::<()>().await;
        }
        if let Some((at, message)) = &script.fail_at {
            if *at == step {
                anyhow::bail!("{}", message);
            }
        }
        Ok(script)
    }
}

#[async_trait]
impl FetchPipeline for ScriptedPipeline {
    async fn search(
        &self,
        _ctx: &StepContext,
        source: &Source,
        keyword: &str,
    ) -> Result<Vec<SearchResult>> {
        Ok(self.step(Step::Search, source, keyword).await?.search)
    }

    async fn explore(
        &self,
        _ctx: &StepContext,
        source: &Source,
        url: &str,
    ) -> Result<Vec<SearchResult>> {
        Ok(self.step(Step::Explore, source, url).await?.explore)
    }

    async fn fetch_info(&self, _ctx: &StepContext, source: &Source, mut item: Item) -> Result<Item> {
        self.step(Step::Info, source, &item.book_url).await?;
        item.toc_url = Some(format!("{}/toc", item.book_url));
        Ok(item)
    }

    async fn fetch_toc(
        &self,
        _ctx: &StepContext,
        source: &Source,
        item: &Item,
    ) -> Result<Vec<Chapter>> {
        let toc_url = item.toc_url.clone().unwrap_or_default();
        Ok(self.step(Step::Toc, source, &toc_url).await?.toc)
    }

    async fn fetch_content(
        &self,
        _ctx: &StepContext,
        source: &Source,
        _item: &Item,
        chapter: &Chapter,
        next_chapter_url: Option<&str>,
        persist: bool,
    ) -> Result<String> {
        assert!(!persist, "probe content must not be persisted");
        let arg = format!("{} -> {}", chapter.url, next_chapter_url.unwrap_or("-"));
        Ok(self.step(Step::Content, source, &arg).await?.content)
    }
}

/// Recorder that remembers final messages and reports a fixed response time.
#[derive(Default)]
pub(crate) struct NoteRecorder {
    pub messages: Mutex<Vec<(String, String)>>,
    pub ended: Mutex<usize>,
}

pub(crate) const NOTE_RESPONSE: Duration = Duration::from_millis(1234);

impl NoteRecorder {
    pub fn message_for(&self, url: &str) -> Option<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == url)
            .map(|(_, m)| m.clone())
    }
}

impl CheckRecorder for NoteRecorder {
    fn begin(&self, _source: &Source) {}

    fn final_message(&self, url: &str, text: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((url.to_string(), text.to_string()));
    }

    fn response_time(&self, _url: &str) -> Duration {
        NOTE_RESPONSE
    }

    fn end(&self) {
        *self.ended.lock().unwrap() += 1;
    }
}

pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub pipeline: Arc<ScriptedPipeline>,
    pub recorder: Arc<NoteRecorder>,
    pub cfg: CheckConfig,
}

impl Fixture {
    pub fn new(sources: impl IntoIterator<Item = Source>, script: Script) -> Self {
        Self {
            store: Arc::new(MemoryStore::with(sources)),
            pipeline: Arc::new(ScriptedPipeline::new(script)),
            recorder: Arc::new(NoteRecorder::default()),
            cfg: CheckConfig::default(),
        }
    }

    pub fn deps(&self) -> CheckDeps {
        CheckDeps {
            store: self.store.clone(),
            pipeline: self.pipeline.clone(),
            recorder: self.recorder.clone(),
            cfg: self.cfg.clone(),
        }
    }
}

pub(crate) fn numbered_sources(n: usize) -> Vec<Source> {
    (0..n)
        .map(|i| Source::new(format!("https://s{}.example", i), format!("source {}", i)))
        .collect()
}
