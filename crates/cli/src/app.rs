use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use trialdesk_api::{Identity, User};
use trialdesk_api_client::{LatencySimulator, MockApi, RetryConfig, TrialApi};
use trialdesk_local_store::{FileStore, KeyValueStore};
use trialdesk_query::{Queries, QueryConfig};
use trialdesk_runtime_config::TrialdeskConfig;
use trialdesk_session::{SessionState, SessionStore};

/// Everything a command needs, wired from the effective config.
pub struct App {
    pub session: SessionStore,
    pub queries: Queries,
    default_identity: Identity,
}

impl App {
    pub fn build(config: &TrialdeskConfig, latency: Option<Duration>) -> Result<Self> {
        let latency = latency.unwrap_or_else(|| config.api.latency());
        let api: Arc<dyn TrialApi> = Arc::new(
            MockApi::seeded()
                .context("Failed to load mock fixtures")?
                .with_latency(LatencySimulator::new(latency)),
        );

        let store = match config.storage.dir() {
            Some(dir) => FileStore::in_dir(dir),
            None => FileStore::open_default().context("Could not determine data directory")?,
        };
        tracing::debug!("local store at {}", store.path().display());
        let storage: Arc<dyn KeyValueStore> = Arc::new(store);

        let queries = Queries::new(
            api.clone(),
            QueryConfig {
                retry: RetryConfig::with_delay(config.query.max_retries, config.query.retry_delay()),
                stale_time: config.query.stale_time(),
            },
        );

        Ok(Self {
            session: SessionStore::new(api, storage),
            queries,
            default_identity: config.session.identity(),
        })
    }

    /// Log in the requested account, else whoever logged in last, else the
    /// configured default.
    pub async fn current_user(&self, requested: Option<Identity>) -> Result<User> {
        let identity = requested
            .or_else(|| self.session.persisted_user().map(|u| u.identity()))
            .unwrap_or(self.default_identity);

        match self.session.init(identity).await {
            SessionState::Ready(Some(user)) => Ok(user),
            SessionState::Error(message) => bail!("login as {identity} failed: {message}"),
            other => bail!("session not ready: {other:?}"),
        }
    }
}
