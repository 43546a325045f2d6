// src/ingest/mod.rs
//! Mining pipeline: fetch → extract → score → threshold → tag → dedup-insert.

pub mod fetch;
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::Utc;
use metrics::{counter, gauge};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::MinerConfig;
use crate::error::Result;
use crate::ingest::types::{
    CycleReport, Fetcher, ItemSink, KeywordStore, SourceRegistry, SourceReport,
};
use crate::model::{NewItem, Source, SourceKind};
use crate::relevance::{self, Thresholds};
use crate::store::Store;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Normalize extracted text: strip tags, decode entities, collapse whitespace.
///
/// Tags go first so escaped markup such as `Vec&lt;T&gt;` survives as text.
pub fn clean_text(s: &str) -> String {
    let stripped = RE_TAGS.replace_all(s, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

/// Thresholds and per-fetch caps applied to every source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningLimits {
    pub thresholds: Thresholds,
    pub rss_max_items: usize,
    pub web_max_items: usize,
}

impl Default for MiningLimits {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            rss_max_items: 10,
            web_max_items: 5,
        }
    }
}

impl MiningLimits {
    pub fn from_config(cfg: &MinerConfig) -> Self {
        Self {
            thresholds: cfg.thresholds(),
            rss_max_items: cfg.rss_max_items,
            web_max_items: cfg.web_max_items,
        }
    }

    pub fn max_items(&self, kind: SourceKind) -> usize {
        match kind {
            SourceKind::Rss => self.rss_max_items,
            SourceKind::Web => self.web_max_items,
        }
    }
}

/// The collaborators one cycle needs. Storage seams are trait objects so the
/// pipeline runs against SQLite in production and anything else in tests.
#[derive(Clone)]
pub struct Pipeline {
    sources: Arc<dyn SourceRegistry>,
    keywords: Arc<dyn KeywordStore>,
    sink: Arc<dyn ItemSink>,
    fetcher: Arc<dyn Fetcher>,
    limits: MiningLimits,
}

impl Pipeline {
    pub fn new(
        sources: Arc<dyn SourceRegistry>,
        keywords: Arc<dyn KeywordStore>,
        sink: Arc<dyn ItemSink>,
        fetcher: Arc<dyn Fetcher>,
        limits: MiningLimits,
    ) -> Self {
        Self {
            sources,
            keywords,
            sink,
            fetcher,
            limits,
        }
    }

    /// All three storage seams backed by one SQLite store.
    pub fn with_store(store: Store, fetcher: Arc<dyn Fetcher>, limits: MiningLimits) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store, fetcher, limits)
    }

    pub fn limits(&self) -> MiningLimits {
        self.limits
    }

    /// One pass over all enabled sources.
    ///
    /// `cancelled` is polled before each source; once it reports true the
    /// remaining sources are left for the next cycle. Per-source failures are
    /// logged and counted, never returned. Every visited source gets its
    /// last-sync time advanced, failed or not.
    pub async fn run_cycle<F>(&self, cancelled: F) -> Result<CycleReport>
    where
        F: Fn() -> bool + Send + Sync,
    {
        crate::metrics::describe_mining_series();
        counter!("mining_cycles_total").increment(1);

        let sources = self.sources.list_enabled().await?;
        let keywords: Vec<String> = self
            .keywords
            .list_all()
            .await?
            .into_iter()
            .map(|k| k.text)
            .collect();

        let mut report = CycleReport::default();
        if keywords.is_empty() {
            warn!(target: "mining", "no keywords configured; skipping mining work");
            report.skipped_no_keywords = true;
            return Ok(report);
        }

        for source in &sources {
            if cancelled() {
                info!(target: "mining", "cancellation observed; leaving remaining sources");
                report.cancelled = true;
                break;
            }

            counter!("mining_sources_total").increment(1);
            report.sources_processed += 1;

            match self.mine_source(source, &keywords).await {
                Ok(r) => {
                    report.discovered += r.discovered;
                    info!(
                        target: "mining",
                        source = %source.name,
                        kind = %source.kind,
                        candidates = r.candidates,
                        below_threshold = r.below_threshold,
                        duplicates = r.duplicates,
                        discovered = r.discovered,
                        "source mined"
                    );
                }
                Err(e) => {
                    report.sources_failed += 1;
                    counter!("mining_source_errors_total").increment(1);
                    warn!(target: "mining", source = %source.name, url = %source.url, error = %e, "source failed");
                }
            }

            if let Err(e) = self.sources.update_last_sync(source.id, Utc::now()).await {
                warn!(target: "mining", source = %source.name, error = %e, "could not update last sync");
            }
        }

        gauge!("mining_last_cycle_ts").set(Utc::now().timestamp() as f64);
        info!(
            target: "mining",
            processed = report.sources_processed,
            failed = report.sources_failed,
            discovered = report.discovered,
            "cycle finished"
        );
        Ok(report)
    }

    /// Fetch, extract, score and persist one source.
    pub async fn mine_source(&self, source: &Source, keywords: &[String]) -> Result<SourceReport> {
        let body = self.fetcher.fetch(&source.url).await?;
        let threshold = self.limits.thresholds;
        let mut report = SourceReport::default();

        for cand in providers::extract(source, &body, self.limits.max_items(source.kind)) {
            report.candidates += 1;

            let text = match source.kind {
                SourceKind::Rss => format!("{} {}", cand.title, cand.summary),
                SourceKind::Web => cand.title.clone(),
            };
            let score = relevance::score(&text, keywords);
            if !threshold.passes(source.kind, score) {
                report.below_threshold += 1;
                continue;
            }

            let item = NewItem {
                tags: relevance::tags(&text, keywords),
                title: cand.title,
                summary: cand.summary,
                url: cand.link,
                source_name: source.name.clone(),
                relevance: score,
                published_at: cand.published,
            };
            if self.sink.try_insert(&item).await? {
                report.discovered += 1;
            } else {
                report.duplicates += 1;
            }
        }

        counter!("mining_candidates_total").increment(report.candidates as u64);
        counter!("mining_below_threshold_total").increment(report.below_threshold as u64);
        counter!("mining_duplicates_total").increment(report.duplicates as u64);
        counter!("mining_discovered_total").increment(report.discovered as u64);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_ws_and_strips_tags() {
        let s = "  <b>Hello</b>,&nbsp;&nbsp; world!  ";
        assert_eq!(clean_text(s), "Hello, world!");
    }

    #[test]
    fn clean_text_keeps_escaped_markup_and_quotes() {
        assert_eq!(clean_text("Vec&lt;T&gt; in Rust"), "Vec<T> in Rust");
        assert_eq!(clean_text("<p>a &amp; b</p>"), "a & b");
        assert_eq!(clean_text("\u{201C}ok\u{201D}"), "\u{201C}ok\u{201D}");
    }

    #[test]
    fn clean_text_does_not_truncate() {
        let long = "word ".repeat(1_000);
        assert_eq!(clean_text(&long).chars().count(), 4_999);
    }

    #[test]
    fn limits_pick_cap_by_kind() {
        let l = MiningLimits::default();
        assert_eq!(l.max_items(SourceKind::Rss), 10);
        assert_eq!(l.max_items(SourceKind::Web), 5);
    }
}
