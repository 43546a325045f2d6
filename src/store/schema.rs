//! SQLite schema definition

/// Tables for sources, keywords and discovered items.
///
/// The UNIQUE constraint on `discovered_items` is the dedup key: inserts
/// racing on the same (title, url, source_name) resolve inside SQLite.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('rss', 'web')),
    url TEXT NOT NULL CHECK (length(url) > 0),
    enabled INTEGER NOT NULL DEFAULT 1,
    last_sync TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS discovered_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL DEFAULT '',
    source_name TEXT NOT NULL,
    relevance REAL NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    published_at TEXT,
    discovered_at TEXT NOT NULL,
    UNIQUE (title, url, source_name)
);

CREATE INDEX IF NOT EXISTS idx_sources_enabled ON sources(enabled);
CREATE INDEX IF NOT EXISTS idx_discovered_at ON discovered_items(discovered_at);
"#;
