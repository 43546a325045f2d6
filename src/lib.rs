// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod relevance;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::MinerConfig;
pub use crate::error::{FetchError, MinerError};
pub use crate::ingest::scheduler::MiningScheduler;
pub use crate::ingest::{MiningLimits, Pipeline};
pub use crate::store::Store;

use std::sync::Arc;

use crate::ingest::fetch::HttpFetcher;

/// Open storage, seed defaults and build the scheduler + HTTP state from
/// `cfg`. The scheduler is returned idle.
pub async fn bootstrap(cfg: &MinerConfig) -> anyhow::Result<AppState> {
    let store = Store::connect(&cfg.db_path).await?;
    if cfg.seed_defaults {
        store.seed_defaults(cfg).await?;
    }

    let fetcher = Arc::new(HttpFetcher::new(cfg.fetch_timeout())?);
    let limits = MiningLimits::from_config(cfg);
    let pipeline = Pipeline::with_store(store.clone(), fetcher, limits);
    let scheduler = MiningScheduler::new(pipeline, cfg.interval_hours)?;

    Ok(AppState {
        store,
        scheduler,
        port: cfg.port,
    })
}
