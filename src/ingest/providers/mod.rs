// src/ingest/providers/mod.rs
pub mod rss;
pub mod web;

use crate::ingest::types::CandidateItem;
use crate::model::{Source, SourceKind};

/// Pick the extractor for `source.kind` and yield at most `max_items`
/// candidates from `body`.
pub fn extract<'a>(
    source: &'a Source,
    body: &'a str,
    max_items: usize,
) -> Box<dyn Iterator<Item = CandidateItem> + Send + 'a> {
    match source.kind {
        SourceKind::Rss => Box::new(rss::extract(body, max_items)),
        SourceKind::Web => Box::new(web::extract(body, &source.name, &source.url, max_items)),
    }
}
