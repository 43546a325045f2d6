// src/relevance.rs
//! Keyword relevance scoring.
//!
//! Score = (matched keyword ratio * 0.7 + occurrence weight * 0.3) * 100,
//! where the occurrence weight saturates at 10 total hits. Breadth of
//! coverage dominates; repetition helps only up to the cap.

use crate::model::SourceKind;

const KEYWORD_SHARE: f64 = 0.7;
const OCCURRENCE_SHARE: f64 = 0.3;
const OCCURRENCE_CAP: f64 = 10.0;

/// Per-kind relevance thresholds. An item is kept only when its score is
/// strictly greater than the threshold for its source kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub rss: f64,
    pub web: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rss: 50.0,
            web: 60.0,
        }
    }
}

impl Thresholds {
    pub fn for_kind(&self, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::Rss => self.rss,
            SourceKind::Web => self.web,
        }
    }

    pub fn passes(&self, kind: SourceKind, score: f64) -> bool {
        score > self.for_kind(kind)
    }
}

/// Relevance of `text` against `keywords`, in `[0, 100]`.
///
/// Blank keywords never match but still count toward the denominator.
pub fn score<S: AsRef<str>>(text: &str, keywords: &[S]) -> f64 {
    if text.is_empty() || keywords.is_empty() {
        return 0.0;
    }

    let haystack = text.to_lowercase();
    let mut matched = 0usize;
    let mut occurrences = 0usize;

    for kw in keywords {
        let n = count_occurrences(&haystack, kw.as_ref());
        if n > 0 {
            matched += 1;
            occurrences += n;
        }
    }

    let ratio = matched as f64 / keywords.len() as f64;
    let weight = (occurrences as f64 / OCCURRENCE_CAP).min(1.0);
    ((ratio * KEYWORD_SHARE + weight * OCCURRENCE_SHARE) * 100.0).clamp(0.0, 100.0)
}

/// Keywords (original casing, input order) present in `text`.
pub fn tags<S: AsRef<str>>(text: &str, keywords: &[S]) -> Vec<String> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(AsRef::as_ref)
        .filter(|kw| count_occurrences(&haystack, kw) > 0)
        .map(str::to_string)
        .collect()
}

/// Non-overlapping, case-insensitive occurrences of the trimmed `keyword` in
/// an already-lowercased haystack.
fn count_occurrences(haystack_lower: &str, keyword: &str) -> usize {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return 0;
    }
    let needle = keyword.to_lowercase();
    haystack_lower.matches(needle.as_str()).count()
}
