//! Persisted records: sources, keywords and discovered items.
//!
//! JSON field names follow the existing desktop client (`type`, `lastSync`,
//! `keyword`, `source`, `timestamp`, ...), so the structs rename on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;

use crate::error::{MinerError, Result};

/// How a source is mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Web,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Rss => "rss",
            SourceKind::Web => "web",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rss" => Ok(SourceKind::Rss),
            "web" => Ok(SourceKind::Web),
            other => Err(MinerError::Validation(format!(
                "unknown source type: {other}"
            ))),
        }
    }
}

/// A configured origin the miner polls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    pub enabled: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Source {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let kind = kind
            .parse::<SourceKind>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            kind,
            url: row.try_get("url")?,
            enabled: row.try_get("enabled")?,
            last_sync: row.try_get("last_sync")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Payload for registering a source.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NewSource {
    pub fn new(name: impl Into<String>, kind: SourceKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            url: url.into(),
            enabled: true,
        }
    }

    /// Trim name/url and reject blanks.
    pub fn validated(mut self) -> Result<Self> {
        self.name = non_blank("name", &self.name)?;
        self.url = non_blank("url", &self.url)?;
        Ok(self)
    }
}

/// Field-level update of a source. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl SourceUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.url.is_none() && self.enabled.is_none()
    }

    /// Trim present fields, reject blanks and empty requests.
    pub fn validated(self) -> Result<Self> {
        if self.is_empty() {
            return Err(MinerError::Validation("no fields to update".into()));
        }
        Ok(Self {
            name: self.name.as_deref().map(|n| non_blank("name", n)).transpose()?,
            url: self.url.as_deref().map(|u| non_blank("url", u)).transpose()?,
            enabled: self.enabled,
        })
    }
}

/// A search term. Matching is case-insensitive; uniqueness is as stored.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub id: i64,
    #[serde(rename = "keyword")]
    #[sqlx(rename = "keyword")]
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A scored item about to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source_name: String,
    pub relevance: f64,
    pub tags: Vec<String>,
    pub published_at: Option<String>,
}

/// A persisted match. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredItem {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub url: String,
    #[serde(rename = "source")]
    pub source_name: String,
    pub relevance: f64,
    pub tags: Vec<String>,
    #[serde(rename = "timestamp")]
    pub published_at: Option<String>,
    #[serde(rename = "discoveredAt")]
    pub discovered_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for DiscoveredItem {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let tags: Option<String> = row.try_get("tags")?;
        let tags = match tags.as_deref() {
            Some(raw) if !raw.is_empty() => {
                serde_json::from_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            }
            _ => Vec::new(),
        };
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            summary: row.try_get("summary")?,
            url: row.try_get("url")?,
            source_name: row.try_get("source_name")?,
            relevance: row.try_get("relevance")?,
            tags,
            published_at: row.try_get("published_at")?,
            discovered_at: row.try_get("discovered_at")?,
        })
    }
}

fn non_blank(field: &str, value: &str) -> Result<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(MinerError::Validation(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}
