// src/metrics.rs
//! Prometheus exposition for the mining series.

use axum::{http::header, routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// Register help text for every mining series once per process, so they show
/// up on `/metrics` before the first cycle records anything.
pub fn describe_mining_series() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("mining_cycles_total", "Mining cycles started.");
        describe_counter!("mining_sources_total", "Sources visited by a cycle.");
        describe_counter!(
            "mining_source_errors_total",
            "Sources whose fetch or persistence failed."
        );
        describe_counter!(
            "mining_candidates_total",
            "Candidate items produced by extractors."
        );
        describe_counter!(
            "mining_below_threshold_total",
            "Candidates dropped for scoring at or below the threshold."
        );
        describe_counter!(
            "mining_duplicates_total",
            "Candidates already stored under the same dedup key."
        );
        describe_counter!("mining_discovered_total", "Newly stored items.");
        describe_histogram!("mining_fetch_ms", "Source fetch time in milliseconds.");
        describe_histogram!("mining_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "mining_last_cycle_ts",
            "Unix ts when the last mining cycle finished."
        );
        describe_gauge!("mining_interval_hours", "Configured hours between cycles.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already set.
    pub fn init() -> anyhow::Result<Self> {
        // Default buckets; histograms render as summaries.
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe_mining_series();
        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move {
                    (
                        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                        h.render(),
                    )
                }
            }),
        )
    }
}
