//! Durable storage on SQLite.
//!
//! One `Store` backs all three pipeline seams (source registry, keyword
//! store, item sink) plus the management operations the HTTP layer calls.
//! Every statement runs as its own short transaction on a shared pool.

mod schema;

pub use schema::SCHEMA_SQL;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MinerConfig;
use crate::error::{MinerError, Result};
use crate::ingest::types::{ItemSink, KeywordStore, SourceRegistry};
use crate::model::{DiscoveredItem, Keyword, NewItem, NewSource, Source, SourceUpdate};

/// Hard upper bound for one page of discovered items.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Storage handle. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database file at `path` and ensure the schema.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        debug!("Connecting to SQLite database at {:?}", path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database; a single pinned connection keeps it alive.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert the configured default sources/keywords into empty tables.
    pub async fn seed_defaults(&self, cfg: &MinerConfig) -> Result<()> {
        let (sources,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sources")
            .fetch_one(&self.pool)
            .await?;
        if sources == 0 {
            for seed in &cfg.default_sources {
                self.create_source(NewSource::from(seed)).await?;
            }
            info!(count = cfg.default_sources.len(), "seeded default sources");
        }

        let (keywords,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM keywords")
            .fetch_one(&self.pool)
            .await?;
        if keywords == 0 {
            for kw in &cfg.default_keywords {
                match self.add_keyword(kw).await {
                    Ok(_) | Err(MinerError::DuplicateKeyword(_)) => {}
                    Err(e) => return Err(e),
                }
            }
            info!(count = cfg.default_keywords.len(), "seeded default keywords");
        }
        Ok(())
    }

    // ===== Sources =====

    pub async fn create_source(&self, new: NewSource) -> Result<Source> {
        let new = new.validated()?;
        let created_at = Utc::now();
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sources (name, kind, url, enabled, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(new.kind.as_str())
        .bind(&new.url)
        .bind(new.enabled)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Source {
            id,
            name: new.name,
            kind: new.kind,
            url: new.url,
            enabled: new.enabled,
            last_sync: None,
            created_at,
        })
    }

    /// All sources, newest first.
    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, Source>(
            "SELECT * FROM sources ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_source(&self, id: i64) -> Result<Source> {
        sqlx::query_as::<_, Source>("SELECT * FROM sources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(MinerError::NotFound { what: "source", id })
    }

    pub async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, Source>(
            "SELECT * FROM sources WHERE enabled = 1 ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Apply a validated field-level update; one fixed statement per field.
    pub async fn update_source(&self, id: i64, update: SourceUpdate) -> Result<Source> {
        let update = update.validated()?;
        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM sources WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(MinerError::NotFound { what: "source", id });
        }

        if let Some(name) = &update.name {
            sqlx::query("UPDATE sources SET name = ? WHERE id = ?")
                .bind(name)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(url) = &update.url {
            sqlx::query("UPDATE sources SET url = ? WHERE id = ?")
                .bind(url)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(enabled) = update.enabled {
            sqlx::query("UPDATE sources SET enabled = ? WHERE id = ?")
                .bind(enabled)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_source(id).await
    }

    pub async fn delete_source(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(MinerError::NotFound { what: "source", id });
        }
        Ok(())
    }

    pub async fn touch_last_sync(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE sources SET last_sync = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ===== Keywords =====

    /// Store a trimmed keyword. Exact duplicates are rejected.
    pub async fn add_keyword(&self, text: &str) -> Result<Keyword> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MinerError::Validation("keyword must not be empty".into()));
        }
        let created_at = Utc::now();
        let res: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO keywords (keyword, created_at) VALUES (?, ?) RETURNING id",
        )
        .bind(text)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await;

        match res {
            Ok((id,)) => Ok(Keyword {
                id,
                text: text.to_string(),
                created_at,
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(MinerError::DuplicateKeyword(text.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All keywords, newest first.
    pub async fn list_keywords(&self) -> Result<Vec<Keyword>> {
        let rows = sqlx::query_as::<_, Keyword>(
            "SELECT id, keyword, created_at FROM keywords ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete_keyword(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM keywords WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(MinerError::NotFound { what: "keyword", id });
        }
        Ok(())
    }

    // ===== Discovered items =====

    /// Insert unless (title, url, source_name) already exists.
    pub async fn try_insert_item(&self, item: &NewItem) -> Result<bool> {
        let tags = serde_json::to_string(&item.tags)
            .map_err(|e| MinerError::Validation(format!("tags not serializable: {e}")))?;
        let res = sqlx::query(
            r#"
            INSERT INTO discovered_items
                (title, summary, url, source_name, relevance, tags, published_at, discovered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (title, url, source_name) DO NOTHING
            "#,
        )
        .bind(&item.title)
        .bind(&item.summary)
        .bind(&item.url)
        .bind(&item.source_name)
        .bind(item.relevance)
        .bind(tags)
        .bind(&item.published_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Newest first. `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list_discovered(&self, limit: i64, offset: i64) -> Result<Vec<DiscoveredItem>> {
        let rows = sqlx::query_as::<_, DiscoveredItem>(
            r#"
            SELECT * FROM discovered_items
            ORDER BY discovered_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit.clamp(1, MAX_PAGE_SIZE))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_discovered(&self) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM discovered_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl SourceRegistry for Store {
    async fn list_enabled(&self) -> Result<Vec<Source>> {
        self.list_enabled_sources().await
    }

    async fn update_last_sync(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.touch_last_sync(id, at).await
    }
}

#[async_trait]
impl KeywordStore for Store {
    async fn list_all(&self) -> Result<Vec<Keyword>> {
        let rows = sqlx::query_as::<_, Keyword>(
            "SELECT id, keyword, created_at FROM keywords ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ItemSink for Store {
    async fn try_insert(&self, item: &NewItem) -> Result<bool> {
        self.try_insert_item(item).await
    }
}
