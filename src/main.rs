//! wiseflow-miner binary entrypoint.
//! Loads config, opens storage, boots the Axum HTTP server and (optionally)
//! the mining loop.

use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wiseflow_miner::metrics::Metrics;
use wiseflow_miner::{bootstrap, router, MinerConfig};

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wiseflow_miner=info,mining=info,tower_http=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed; running until killed");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = MinerConfig::load_default()?;
    let metrics = Metrics::init()?;
    let state = bootstrap(&cfg).await?;
    let scheduler = state.scheduler.clone();

    if cfg.autostart {
        scheduler.start();
    }

    let app = router(state).merge(metrics.router());
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, db = %cfg.db_path.display(), interval_hours = cfg.interval_hours, "wiseflow-miner listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    info!("service stopped");
    Ok(())
}
