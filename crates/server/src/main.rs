use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use trialdesk_api_client::{LatencySimulator, MockApi};
use trialdesk_mock_db::MockDb;
use trialdesk_runtime_config::TrialdeskConfig;
use trialdesk_server::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trialdesk_server=info,tower_http=info".into()),
        )
        .init();

    let config = load_config()?;

    let bind = std::env::var("TRIALDESK_BIND")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or(config.server.bind.clone());
    let latency = match std::env::var("TRIALDESK_LATENCY_MS") {
        Ok(raw) => Duration::from_millis(
            raw.trim()
                .parse()
                .with_context(|| format!("invalid TRIALDESK_LATENCY_MS: {raw}"))?,
        ),
        Err(_) => config.api.latency(),
    };

    let db = MockDb::seeded().context("load mock fixtures")?;
    tracing::info!("mock database loaded, simulated latency {latency:?}");
    let api = MockApi::new(Arc::new(db), LatencySimulator::new(latency));

    let app = router(AppState::new(Arc::new(api)));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    tracing::info!("starting server at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// `TRIALDESK_CONFIG` names a TOML file; without it, defaults apply.
fn load_config() -> anyhow::Result<TrialdeskConfig> {
    let Some(path) = std::env::var("TRIALDESK_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
    else {
        return Ok(TrialdeskConfig::default());
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config = TrialdeskConfig::from_toml_str(&raw)
        .with_context(|| format!("parse config {}", path.display()))?;
    tracing::info!("config loaded from {}", path.display());
    Ok(config)
}
