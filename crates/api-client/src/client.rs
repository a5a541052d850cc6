use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use trialdesk_api::paths::{self, InvitationAction};
use trialdesk_api::*;

use crate::facade::TrialApi;

/// Typed HTTP client for a TrialDesk server.
///
/// Implements [`TrialApi`] against the REST paths in [`trialdesk_api::paths`],
/// so it is a drop-in replacement for the in-process mock.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    // ── Raw helpers ───────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthResponse, ServiceError> {
        self.get(paths::HEALTH_ROUTE).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        debug!(path, "GET");
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(transport)?;
        parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        debug!(path, "POST");
        let resp = self
            .client
            .post(self.url(path))
            .send()
            .await
            .map_err(transport)?;
        parse_response(resp).await
    }
}

#[async_trait]
impl TrialApi for HttpApi {
    async fn login_site(&self, number: u32) -> Result<User, ServiceError> {
        self.get(&paths::site_lookup(number)).await
    }

    async fn login_sponsor(&self, number: u32) -> Result<User, ServiceError> {
        self.get(&paths::sponsor_lookup(number)).await
    }

    async fn get_site_analytics(&self, site_id: &str) -> Result<SiteAnalytics, ServiceError> {
        self.get(&paths::site_analytics(site_id)).await
    }

    async fn get_site_trials(&self, site_id: &str) -> Result<SiteTrialsResponse, ServiceError> {
        self.get(&paths::site_trials(site_id)).await
    }

    async fn get_site_pending_invitations(
        &self,
        site_id: &str,
    ) -> Result<SitePendingInvitationsResponse, ServiceError> {
        self.get(&paths::site_invitations(site_id)).await
    }

    async fn find_matching_trials(
        &self,
        site_id: &str,
    ) -> Result<MatchingTrialsResponse, ServiceError> {
        self.get(&paths::site_matching_trials(site_id)).await
    }

    async fn get_site_trial_documents(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<SiteTrialDocumentsResponse, ServiceError> {
        self.get(&paths::site_trial_documents(site_id, trial_id))
            .await
    }

    async fn get_sponsor_details(
        &self,
        sponsor_id: &str,
    ) -> Result<SponsorDetailsResponse, ServiceError> {
        self.get(&paths::sponsor(sponsor_id)).await
    }

    async fn get_sponsor_pending_invitations(
        &self,
        sponsor_id: &str,
    ) -> Result<SponsorPendingInvitationsResponse, ServiceError> {
        self.get(&paths::sponsor_invitations(sponsor_id)).await
    }

    async fn get_trial_details(&self, trial_id: &str) -> Result<Trial, ServiceError> {
        self.get(&paths::trial(trial_id)).await
    }

    async fn get_trial_sites(&self, trial_id: &str) -> Result<TrialSitesResponse, ServiceError> {
        self.get(&paths::trial_sites(trial_id)).await
    }

    async fn get_trial_with_sites(
        &self,
        trial_id: &str,
    ) -> Result<TrialWithSitesResponse, ServiceError> {
        self.get(&paths::trial_with_sites(trial_id)).await
    }

    async fn find_matching_sites(
        &self,
        trial_id: &str,
    ) -> Result<MatchingSitesResponse, ServiceError> {
        self.get(&paths::trial_matching_sites(trial_id)).await
    }

    async fn accept_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.post(&paths::site_invitation_action(
            site_id,
            trial_id,
            InvitationAction::Accept,
        ))
        .await
    }

    async fn decline_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.post(&paths::site_invitation_action(
            site_id,
            trial_id,
            InvitationAction::Decline,
        ))
        .await
    }

    async fn accept_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.post(&paths::trial_invitation_action(
            trial_id,
            site_id,
            InvitationAction::Accept,
        ))
        .await
    }

    async fn decline_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.post(&paths::trial_invitation_action(
            trial_id,
            site_id,
            InvitationAction::Decline,
        ))
        .await
    }
}

fn transport(e: reqwest::Error) -> ServiceError {
    ServiceError::Internal(format!("request failed: {e}"))
}

/// Parse an HTTP response: return the deserialized body on 2xx, or rebuild
/// the server's `ServiceError` from its status and `{"error": ...}` body.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ServiceError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("{status}: {body}"));
        return Err(ServiceError::from_status(status.as_u16(), message));
    }
    resp.json()
        .await
        .map_err(|e| ServiceError::Internal(format!("invalid response body: {e}")))
}
