// tests/common/mod.rs
// Shared helpers: a scripted fetcher and an in-memory pipeline.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use wiseflow_miner::error::Result;
use wiseflow_miner::ingest::types::{Fetcher, ItemSink, KeywordStore, SourceRegistry};
use wiseflow_miner::model::{Keyword, NewItem, NewSource, Source, SourceKind};
use wiseflow_miner::{FetchError, MiningLimits, Pipeline, Store};

pub const RSS_12: &str = include_str!("../fixtures/rss_12_items.xml");
pub const ATOM: &str = include_str!("../fixtures/atom_feed.xml");
pub const PAGE_8: &str = include_str!("../fixtures/page_8_titles.html");

/// Returns canned bodies per URL and records every call.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Result<String, FetchError>>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(self, url: &str, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn fail(self, url: &str) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Err(FetchError::Transport {
                url: url.to_string(),
                reason: "connection refused".into(),
            }),
        );
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Timeout {
                    url: url.to_string(),
                })
            })
    }
}

pub async fn store_with_keywords(keywords: &[&str]) -> Store {
    let store = Store::in_memory().await.expect("in-memory store");
    for kw in keywords {
        store.add_keyword(kw).await.expect("add keyword");
    }
    store
}

pub async fn add_source(store: &Store, name: &str, kind: SourceKind, url: &str) -> Source {
    store
        .create_source(NewSource::new(name, kind, url))
        .await
        .expect("create source")
}

pub fn pipeline(store: &Store, fetcher: Arc<ScriptedFetcher>) -> Pipeline {
    Pipeline::with_store(store.clone(), fetcher, MiningLimits::default())
}

/// Blocks the first fetch of `gated_url` until `release` is notified.
/// Every URL answers with the same body.
pub struct GatedFetcher {
    gated_url: String,
    body: String,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
    pub calls: Mutex<Vec<String>>,
}

impl GatedFetcher {
    pub fn new(gated_url: &str, body: &str) -> Self {
        Self {
            gated_url: gated_url.to_string(),
            body: body.to_string(),
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if url == self.gated_url && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(self.body.clone())
    }
}

/// Fixed source list that records last-sync updates.
pub struct MemSources {
    sources: Vec<Source>,
    pub synced: Mutex<Vec<i64>>,
}

#[async_trait]
impl SourceRegistry for MemSources {
    async fn list_enabled(&self) -> Result<Vec<Source>> {
        Ok(self.sources.iter().filter(|s| s.enabled).cloned().collect())
    }

    async fn update_last_sync(&self, id: i64, _at: DateTime<Utc>) -> Result<()> {
        self.synced.lock().unwrap().push(id);
        Ok(())
    }
}

pub struct MemKeywords(Vec<String>);

#[async_trait]
impl KeywordStore for MemKeywords {
    async fn list_all(&self) -> Result<Vec<Keyword>> {
        Ok(self
            .0
            .iter()
            .enumerate()
            .map(|(i, k)| Keyword {
                id: i as i64 + 1,
                text: k.clone(),
                created_at: Utc::now(),
            })
            .collect())
    }
}

/// Dedups on (title, url, source name) like the SQLite sink.
#[derive(Default)]
pub struct MemSink {
    pub items: Mutex<Vec<NewItem>>,
}

#[async_trait]
impl ItemSink for MemSink {
    async fn try_insert(&self, item: &NewItem) -> Result<bool> {
        let mut items = self.items.lock().unwrap();
        let dup = items.iter().any(|i| {
            i.title == item.title && i.url == item.url && i.source_name == item.source_name
        });
        if !dup {
            items.push(item.clone());
        }
        Ok(!dup)
    }
}

pub fn mem_source(id: i64, name: &str, kind: SourceKind, url: &str) -> Source {
    Source {
        id,
        name: name.to_string(),
        kind,
        url: url.to_string(),
        enabled: true,
        last_sync: None,
        created_at: Utc::now(),
    }
}

/// Pipeline over plain in-memory seams; no database, no background threads.
pub fn mem_pipeline(
    sources: Vec<Source>,
    keywords: &[&str],
    fetcher: Arc<dyn Fetcher>,
) -> (Pipeline, Arc<MemSources>, Arc<MemSink>) {
    let registry = Arc::new(MemSources {
        sources,
        synced: Mutex::new(Vec::new()),
    });
    let kws = Arc::new(MemKeywords(keywords.iter().map(|k| k.to_string()).collect()));
    let sink = Arc::new(MemSink::default());
    let pipeline = Pipeline::new(
        registry.clone(),
        kws,
        sink.clone(),
        fetcher,
        MiningLimits::default(),
    );
    (pipeline, registry, sink)
}
