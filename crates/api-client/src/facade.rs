use async_trait::async_trait;

use trialdesk_api::{
    Identity, MatchingSitesResponse, MatchingTrialsResponse, MutationResponse, Role,
    ServiceError, SiteAnalytics, SitePendingInvitationsResponse, SiteTrialDocumentsResponse,
    SiteTrialsResponse, SponsorDetailsResponse, SponsorPendingInvitationsResponse, Trial,
    TrialSitesResponse, TrialWithSitesResponse, User,
};

/// Every backend operation the dashboard performs.
///
/// Object-safe so callers hold an `Arc<dyn TrialApi>` and never know whether
/// the in-process mock or a remote server answers.
#[async_trait]
pub trait TrialApi: Send + Sync {
    // Accounts
    async fn login_site(&self, number: u32) -> Result<User, ServiceError>;
    async fn login_sponsor(&self, number: u32) -> Result<User, ServiceError>;

    async fn login(&self, identity: Identity) -> Result<User, ServiceError> {
        match identity.role {
            Role::Site => self.login_site(identity.number).await,
            Role::Sponsor => self.login_sponsor(identity.number).await,
        }
    }

    // Site views
    async fn get_site_analytics(&self, site_id: &str) -> Result<SiteAnalytics, ServiceError>;
    async fn get_site_trials(&self, site_id: &str) -> Result<SiteTrialsResponse, ServiceError>;
    async fn get_site_pending_invitations(
        &self,
        site_id: &str,
    ) -> Result<SitePendingInvitationsResponse, ServiceError>;
    async fn find_matching_trials(&self, site_id: &str)
    -> Result<MatchingTrialsResponse, ServiceError>;
    async fn get_site_trial_documents(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<SiteTrialDocumentsResponse, ServiceError>;

    // Sponsor views
    async fn get_sponsor_details(
        &self,
        sponsor_id: &str,
    ) -> Result<SponsorDetailsResponse, ServiceError>;
    async fn get_sponsor_pending_invitations(
        &self,
        sponsor_id: &str,
    ) -> Result<SponsorPendingInvitationsResponse, ServiceError>;

    // Trial views
    async fn get_trial_details(&self, trial_id: &str) -> Result<Trial, ServiceError>;
    async fn get_trial_sites(&self, trial_id: &str) -> Result<TrialSitesResponse, ServiceError>;
    async fn get_trial_with_sites(
        &self,
        trial_id: &str,
    ) -> Result<TrialWithSitesResponse, ServiceError>;
    async fn find_matching_sites(&self, trial_id: &str)
    -> Result<MatchingSitesResponse, ServiceError>;

    // Invitations sent by a sponsor, answered by the site
    async fn accept_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError>;
    async fn decline_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError>;

    // Requests sent by a site, answered by the sponsor
    async fn accept_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError>;
    async fn decline_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError>;
}
