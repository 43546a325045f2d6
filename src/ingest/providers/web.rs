// src/ingest/providers/web.rs
//! Shallow web-page extractor: `<title>` tags only, no DOM.

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::clean_text;
use crate::ingest::types::CandidateItem;

static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("title regex"));

/// Yield up to `max_items` `<title>` texts from `body`.
///
/// Each candidate links back to the page itself and is stamped with the
/// current time, since pages carry no per-item metadata.
pub fn extract<'a>(
    body: &'a str,
    source_name: &'a str,
    page_url: &'a str,
    max_items: usize,
) -> impl Iterator<Item = CandidateItem> + Send + 'a {
    // The scan stops at the cap; matches are buffered so the iterator stays
    // Send across the sink's await points.
    let titles: Vec<&'a str> = RE_TITLE
        .captures_iter(body)
        .take(max_items)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    titles.into_iter().map(move |raw| CandidateItem {
        title: clean_text(raw),
        summary: format!("from {source_name}"),
        link: page_url.to_string(),
        published: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    })
}
