// src/ingest/fetch.rs
use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;
use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::ingest::types::Fetcher;

/// reqwest-backed fetcher with a client-wide timeout.
///
/// Any response with a readable body is returned, whatever its status.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wiseflow-miner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: format!("building http client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(target: "mining", %url, %status, "non-2xx response, using body anyway");
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        histogram!("mining_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(body)
    }
}
