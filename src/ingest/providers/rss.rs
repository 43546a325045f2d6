// src/ingest/providers/rss.rs
//! Syndication feed extractor: RSS 2.0, RSS 1.0 (RDF) and Atom 1.0.

use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::ParseError;
use crate::ingest::clean_text;
use crate::ingest::types::CandidateItem;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
    // RSS 1.0 keeps items next to the channel, not inside it.
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<LinkNode>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    summary: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<LinkNode>,
    summary: Option<TextNode>,
    content: Option<TextNode>,
    published: Option<String>,
    updated: Option<String>,
}

/// Element whose attributes we ignore, e.g. `<title type="html">`.
#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/// `<link>text</link>` in RSS, `<link href=".." rel=".."/>` in Atom.
#[derive(Debug, Default, Deserialize)]
struct LinkNode {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "$text", default)]
    text: String,
}

/// Feed entry before text cleanup.
#[derive(Debug)]
struct RawEntry {
    title: String,
    summary: String,
    link: String,
    published: Option<String>,
}

/// Parse `body` and yield at most `max_items` candidates.
///
/// Malformed content yields nothing; the parse error is logged at debug.
pub fn extract(body: &str, max_items: usize) -> impl Iterator<Item = CandidateItem> {
    let entries = match parse_entries(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(target: "mining", error = %e, "feed parse failed; treating as empty");
            Vec::new()
        }
    };
    entries
        .into_iter()
        .take(max_items)
        .map(|e| CandidateItem {
            title: clean_text(&e.title),
            summary: clean_text(&e.summary),
            link: e.link.trim().to_string(),
            published: e
                .published
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
}

fn parse_entries(body: &str) -> Result<Vec<RawEntry>, ParseError> {
    let t0 = std::time::Instant::now();
    let xml = scrub_html_entities_for_xml(body);

    let out = match from_str::<Rss>(&xml) {
        Ok(rss) => rss
            .channel
            .item
            .into_iter()
            .chain(rss.item)
            .map(RawEntry::from)
            .collect(),
        Err(rss_err) => match from_str::<AtomFeed>(&xml) {
            Ok(feed) if !feed.entry.is_empty() => {
                feed.entry.into_iter().map(RawEntry::from).collect()
            }
            _ => return Err(ParseError(rss_err.to_string())),
        },
    };

    histogram!("mining_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

impl From<Item> for RawEntry {
    fn from(it: Item) -> Self {
        let link = it
            .links
            .iter()
            .map(|l| l.text.trim())
            .find(|t| !t.is_empty())
            .or_else(|| it.links.iter().find_map(|l| l.href.as_deref()))
            .unwrap_or_default()
            .to_string();
        Self {
            title: it.title.unwrap_or_default(),
            summary: it
                .summary
                .filter(|s| !s.trim().is_empty())
                .or(it.description)
                .unwrap_or_default(),
            link,
            published: it.pub_date,
        }
    }
}

impl From<Entry> for RawEntry {
    fn from(e: Entry) -> Self {
        let link = e
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| e.links.first())
            .and_then(|l| l.href.clone())
            .unwrap_or_default();
        Self {
            title: e.title.unwrap_or_default().value,
            summary: e
                .summary
                .map(|s| s.value)
                .filter(|s| !s.trim().is_empty())
                .or(e.content.map(|c| c.value))
                .unwrap_or_default(),
            link,
            published: e.published.or(e.updated),
        }
    }
}

/// quick-xml only knows the five XML entities; rewrite common HTML ones as
/// numeric references so the parser yields the real characters.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&hellip;", "&#8230;")
        .replace("&ldquo;", "&#8220;")
        .replace("&rdquo;", "&#8221;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rsquo;", "&#8217;")
        .replace("&copy;", "&#169;")
}
