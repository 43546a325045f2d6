// tests/providers_rss.rs
// RSS 2.0 and Atom extraction from fixtures.

mod common;

use wiseflow_miner::ingest::providers::rss;

#[test]
fn rss_fixture_is_capped_at_ten() {
    let items: Vec<_> = rss::extract(common::RSS_12, 10).collect();
    assert_eq!(items.len(), 10);
    assert_eq!(items[0].title, "Rust release notes 1");
    assert_eq!(items[0].summary, "Rust and Tokio news, part 1.");
    assert_eq!(items[0].link, "https://blog.example.com/rust-1");
    assert_eq!(items[9].link, "https://blog.example.com/rust-10");
}

#[test]
fn rss_cap_larger_than_feed_returns_everything() {
    assert_eq!(rss::extract(common::RSS_12, 50).count(), 12);
}

#[test]
fn atom_fixture_parses_entries() {
    let items: Vec<_> = rss::extract(common::ATOM, 10).collect();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].title, "Machine learning & AI roundup");
    assert_eq!(items[0].link, "https://atom.example.com/ml-roundup");
    assert_eq!(items[0].summary, "Weekly AI and ML links.");
    assert_eq!(items[0].published.as_deref(), Some("2024-03-01T09:00:00Z"));

    assert_eq!(items[1].title, "Gardening tips");
    assert_eq!(items[1].link, "https://atom.example.com/garden");
    assert!(!items[1].summary.contains('<'), "markup left in {:?}", items[1].summary);
}

#[test]
fn garbage_yields_no_items() {
    assert_eq!(rss::extract("this is not xml at all", 10).count(), 0);
    assert_eq!(rss::extract("", 10).count(), 0);
    assert_eq!(rss::extract("<html><body>nope</body></html>", 10).count(), 0);
}

#[test]
fn zero_cap_yields_nothing() {
    assert_eq!(rss::extract(common::RSS_12, 0).count(), 0);
}
