mod api;
mod cache;
mod config;
mod errors;
mod exchanges;
mod models;
mod refresh;

use api::ApiServer;
use cache::FundingCache;
use config::{Config, LogFormat};
use exchanges::GateClient;
use refresh::{REFRESH_INTERVAL, RefreshCycle};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "gate-funding starting, upstream {} on port {}",
        config.gate_base_url,
        config.api_port
    );

    let cache = FundingCache::new();
    let gate = GateClient::new(
        config.gate_base_url.clone(),
        config.http_timeout,
        config.max_body_bytes,
    )?;

    // ── 1. Spawn the refresh loop (first tick runs immediately) ────
    let refresher = RefreshCycle::new(Arc::new(gate), cache.clone(), config.empty_policy)
        .spawn(REFRESH_INTERVAL);

    // ── 2. Serve the cache until Ctrl+C ────────────────────────────
    let result = ApiServer::new(cache).run(&config, shutdown_signal()).await;

    refresher.abort();
    tracing::info!("Shutting down...");
    result
}

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
