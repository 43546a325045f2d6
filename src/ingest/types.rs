// src/ingest/types.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{FetchError, Result};
use crate::model::{Keyword, NewItem, Source};

/// One entry produced by an extractor, before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published: Option<String>,
}

/// Read/write access to configured sources.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    async fn list_enabled(&self) -> Result<Vec<Source>>;
    async fn update_last_sync(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
}

/// Read access to the keyword set.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Keyword>>;
}

/// Idempotent persistence keyed by (title, url, source name).
#[async_trait]
pub trait ItemSink: Send + Sync {
    /// `Ok(false)` means an equal item already exists.
    async fn try_insert(&self, item: &NewItem) -> Result<bool>;
}

/// Retrieves the raw body of a source URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// Outcome of mining one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub candidates: usize,
    pub below_threshold: usize,
    pub duplicates: usize,
    pub discovered: usize,
}

/// Outcome of one full cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub sources_processed: usize,
    pub sources_failed: usize,
    pub discovered: usize,
    /// Set when the keyword set was empty and no source was touched.
    pub skipped_no_keywords: bool,
    /// Set when cancellation was observed before every source was visited.
    pub cancelled: bool,
}
