// tests/store_dedup.rs
// File-backed store: concurrent inserts and persistence across reopen.

use wiseflow_miner::model::{NewItem, NewSource, SourceKind};
use wiseflow_miner::Store;

fn item(title: &str) -> NewItem {
    NewItem {
        title: title.into(),
        summary: "s".into(),
        url: "https://example.com/a".into(),
        source_name: "Example".into(),
        relevance: 75.0,
        tags: vec!["rust".into()],
        published_at: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_store_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::connect(&dir.path().join("miner.db")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let s = store.clone();
        handles.push(tokio::spawn(async move { s.try_insert_item(&item("same")).await }));
    }

    let mut inserted = 0;
    for h in handles {
        if h.await.unwrap().unwrap() {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(store.count_discovered().await.unwrap(), 1);
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("nested").join("miner.db");

    {
        let store = Store::connect(&db).await.unwrap();
        store
            .create_source(NewSource::new("Example", SourceKind::Web, "https://example.com"))
            .await
            .unwrap();
        store.add_keyword("rust").await.unwrap();
        assert!(store.try_insert_item(&item("kept")).await.unwrap());
    }

    let store = Store::connect(&db).await.unwrap();
    assert_eq!(store.list_sources().await.unwrap().len(), 1);
    assert_eq!(store.list_keywords().await.unwrap()[0].text, "rust");
    assert!(!store.try_insert_item(&item("kept")).await.unwrap());
    let items = store.list_discovered(10, 0).await.unwrap();
    assert_eq!(items[0].tags, vec!["rust".to_string()]);
}
