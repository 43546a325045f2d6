// src/config.rs
//! Service configuration: TOML file + environment overrides.
//!
//! Lookup order:
//! 1) $MINER_CONFIG_PATH (must exist)
//! 2) config/miner.toml
//! 3) built-in defaults
//!
//! Then `MINER_PORT`, `MINER_DB_PATH`, `MINER_INTERVAL_HOURS` override
//! individual fields.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::scheduler::validate_interval;
use crate::model::{NewSource, SourceKind};
use crate::relevance::Thresholds;

pub const ENV_CONFIG_PATH: &str = "MINER_CONFIG_PATH";
pub const ENV_PORT: &str = "MINER_PORT";
pub const ENV_DB_PATH: &str = "MINER_DB_PATH";
pub const ENV_INTERVAL_HOURS: &str = "MINER_INTERVAL_HOURS";
pub const DEFAULT_CONFIG_PATH: &str = "config/miner.toml";

fn default_port() -> u16 {
    8080
}
fn default_db_path() -> PathBuf {
    PathBuf::from("wiseflow.db")
}
fn default_interval_hours() -> f64 {
    4.0
}
fn default_fetch_timeout_secs() -> u64 {
    30
}
fn default_rss_threshold() -> f64 {
    50.0
}
fn default_web_threshold() -> f64 {
    60.0
}
fn default_rss_max_items() -> usize {
    10
}
fn default_web_max_items() -> usize {
    5
}
fn default_true() -> bool {
    true
}
fn default_keywords() -> Vec<String> {
    ["人工智能", "机器学习", "大模型", "AI新闻"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_sources() -> Vec<SeedSource> {
    vec![
        SeedSource {
            name: "TechCrunch".into(),
            kind: SourceKind::Rss,
            url: "https://techcrunch.com/feed/".into(),
        },
        SeedSource {
            name: "Hacker News".into(),
            kind: SourceKind::Web,
            url: "https://news.ycombinator.com".into(),
        },
    ]
}

/// A source inserted into an empty registry on first start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
}

impl From<&SeedSource> for NewSource {
    fn from(s: &SeedSource) -> Self {
        NewSource::new(s.name.clone(), s.kind, s.url.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Sleep between cycles. Mutable at runtime through the scheduler.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: f64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_rss_threshold")]
    pub rss_threshold: f64,
    #[serde(default = "default_web_threshold")]
    pub web_threshold: f64,
    #[serde(default = "default_rss_max_items")]
    pub rss_max_items: usize,
    #[serde(default = "default_web_max_items")]
    pub web_max_items: usize,
    /// Start mining as soon as the service boots.
    #[serde(default)]
    pub autostart: bool,
    /// Seed empty source/keyword tables with the defaults below.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
    #[serde(default = "default_keywords")]
    pub default_keywords: Vec<String>,
    #[serde(default = "default_sources")]
    pub default_sources: Vec<SeedSource>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_path: default_db_path(),
            interval_hours: default_interval_hours(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            rss_threshold: default_rss_threshold(),
            web_threshold: default_web_threshold(),
            rss_max_items: default_rss_max_items(),
            web_max_items: default_web_max_items(),
            autostart: false,
            seed_defaults: true,
            default_keywords: default_keywords(),
            default_sources: default_sources(),
        }
    }
}

impl MinerConfig {
    /// Parse a TOML document and sanitize it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: MinerConfig = toml::from_str(s).context("parsing miner config toml")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading miner config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the file (env, then fallback path, then defaults) and apply
    /// environment overrides.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from(&fallback)?
            } else {
                Self::default()
            }
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(ENV_PORT) {
            self.port = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid {ENV_PORT}: {raw}"))?;
        }
        if let Ok(raw) = std::env::var(ENV_DB_PATH) {
            if !raw.trim().is_empty() {
                self.db_path = PathBuf::from(raw.trim());
            }
        }
        if let Ok(raw) = std::env::var(ENV_INTERVAL_HOURS) {
            self.interval_hours = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid {ENV_INTERVAL_HOURS}: {raw}"))?;
        }
        Ok(self.sanitized())
    }

    /// Replace out-of-range values with defaults.
    fn sanitized(mut self) -> Self {
        if validate_interval(self.interval_hours).is_err() {
            self.interval_hours = default_interval_hours();
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = default_fetch_timeout_secs();
        }
        if !(0.0..=100.0).contains(&self.rss_threshold) {
            self.rss_threshold = default_rss_threshold();
        }
        if !(0.0..=100.0).contains(&self.web_threshold) {
            self.web_threshold = default_web_threshold();
        }
        self.default_keywords = self
            .default_keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            rss: self.rss_threshold,
            web: self.web_threshold,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
