//! Error types shared by the mining pipeline and the management surface.

use thiserror::Error;

/// Failure to retrieve one source. Never aborts a cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },
}

impl FetchError {
    /// Classify a reqwest failure for `url`.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url } | FetchError::Transport { url, .. } => url,
        }
    }
}

/// Malformed feed content. Extractors turn this into "no items".
#[derive(Error, Debug)]
#[error("parse error: {0}")]
pub struct ParseError(pub String);

/// Errors surfaced by storage and management operations.
#[derive(Error, Debug)]
pub enum MinerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: i64 },

    #[error("keyword already exists: {0}")]
    DuplicateKeyword(String),

    #[error("busy: {0}")]
    Busy(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = MinerError> = std::result::Result<T, E>;
