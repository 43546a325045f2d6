// tests/relevance_scoring.rs
// Scoring formula, bounds and tag extraction.

use wiseflow_miner::relevance::{score, tags};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn worked_example_scores_79() {
    let kws = ["AI", "ML"];
    let s = score("AI is transforming ML workflows, AI everywhere", &kws);
    assert!(approx(s, 79.0), "expected 79.0, got {s}");
}

#[test]
fn empty_text_or_keywords_score_zero() {
    let none: [&str; 0] = [];
    assert_eq!(score("AI everywhere", &none), 0.0);
    assert_eq!(score("", &["AI", "ML"]), 0.0);
}

#[test]
fn matching_is_case_insensitive() {
    let a = score("rust RUST Rust", &["rust"]);
    let b = score("rust rust rust", &["RUST"]);
    assert!(approx(a, b));
    // 1.0*0.7 + 0.3*0.3
    assert!(approx(a, 79.0));
}

#[test]
fn score_stays_in_bounds() {
    let kws = ["a", "b", "c", "ab"];
    let texts = [
        "",
        "a",
        "zzz",
        "abc abc abc abc abc abc abc abc abc abc abc abc",
        &"a".repeat(1_000),
    ];
    for t in texts {
        let s = score(t, &kws);
        assert!((0.0..=100.0).contains(&s), "score {s} out of range for {t:?}");
    }
}

#[test]
fn more_occurrences_never_lower_the_score() {
    let kws = ["tokio", "axum"];
    let mut prev = 0.0;
    for n in 0..15 {
        let text = format!("{} filler", "tokio ".repeat(n));
        let s = score(&text, &kws);
        assert!(s >= prev, "score dropped at n={n}: {prev} -> {s}");
        prev = s;
    }
    // capped at 10 occurrences: ratio 0.5*0.7 + 1.0*0.3
    assert!(approx(prev, 65.0));
}

#[test]
fn breadth_beats_repetition() {
    let kws = ["rust", "tokio", "axum"];
    let broad = score("rust tokio axum", &kws);
    let narrow = score(&"rust ".repeat(10), &kws);
    assert!(broad > narrow, "broad={broad} narrow={narrow}");
}

#[test]
fn tags_keep_keyword_order_and_casing() {
    let kws = ["ML", "AI", "Rust"];
    let t = tags("ai and ml, no crabs here", &kws);
    assert_eq!(t, vec!["ML".to_string(), "AI".to_string()]);
}

#[test]
fn non_ascii_keywords_match() {
    let kws = ["人工智能", "大模型"];
    let s = score("人工智能 与 大模型 的 进展", &kws);
    // both matched, 2 occurrences: 0.7 + 0.2*0.3
    assert!(approx(s, 76.0), "got {s}");
    assert_eq!(tags("大模型", &kws), vec!["大模型".to_string()]);
}
