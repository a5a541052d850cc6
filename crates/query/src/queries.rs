//! Typed dashboard queries on top of [`QueryCache`].
//!
//! One cache holds every payload kind behind [`QueryData`]; each accessor
//! names its [`QueryKey`], fetches through the facade on a miss and hands
//! back the payload as a shared `Arc`.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};
use trialdesk_api::{
    MatchingSitesResponse, MatchingTrialsResponse, MutationResponse, ServiceError, SiteAnalytics,
    SitePendingInvitationsResponse, SiteTrialDocumentsResponse, SiteTrialsResponse,
    SponsorDetailsResponse, SponsorPendingInvitationsResponse, Trial, TrialSitesResponse,
    TrialWithSitesResponse,
};
use trialdesk_api_client::TrialApi;

use crate::cache::{QueryCache, QueryConfig, QuerySnapshot};
use crate::key::{Mutation, QueryKey};

/// A payload type that can live in the shared cache.
pub trait QueryPayload: Send + Sync + Sized + 'static {
    fn into_data(self) -> QueryData;
    fn extract(data: &QueryData) -> Option<Arc<Self>>;
}

macro_rules! query_payloads {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        /// Any payload the dashboard caches.
        #[derive(Debug, Clone)]
        pub enum QueryData {
            $($variant(Arc<$ty>),)+
        }

        $(
            impl QueryPayload for $ty {
                fn into_data(self) -> QueryData {
                    QueryData::$variant(Arc::new(self))
                }

                fn extract(data: &QueryData) -> Option<Arc<Self>> {
                    match data {
                        QueryData::$variant(payload) => Some(Arc::clone(payload)),
                        _ => None,
                    }
                }
            }
        )+
    };
}

query_payloads! {
    SiteAnalytics => SiteAnalytics,
    SiteTrials => SiteTrialsResponse,
    SiteInvitations => SitePendingInvitationsResponse,
    SiteTrialDocuments => SiteTrialDocumentsResponse,
    MatchingTrials => MatchingTrialsResponse,
    SponsorDetails => SponsorDetailsResponse,
    SponsorInvitations => SponsorPendingInvitationsResponse,
    TrialDetails => Trial,
    TrialSites => TrialSitesResponse,
    TrialWithSites => TrialWithSitesResponse,
    MatchingSites => MatchingSitesResponse,
}

/// Dashboard data access: facade calls behind the single-flight cache.
#[derive(Clone)]
pub struct Queries {
    api: Arc<dyn TrialApi>,
    cache: QueryCache<QueryKey, QueryData>,
}

impl Queries {
    pub fn new(api: Arc<dyn TrialApi>, config: QueryConfig) -> Self {
        Self {
            api,
            cache: QueryCache::new(config),
        }
    }

    pub fn api(&self) -> &Arc<dyn TrialApi> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache<QueryKey, QueryData> {
        &self.cache
    }

    pub fn snapshot(&self, key: &QueryKey) -> QuerySnapshot<QueryData> {
        self.cache.snapshot(key)
    }

    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.cache.invalidate(key)
    }

    async fn run<T, F, Fut>(&self, key: QueryKey, call: F) -> Result<Arc<T>, ServiceError>
    where
        T: QueryPayload,
        F: Fn(Arc<dyn TrialApi>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ServiceError>> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let data = self
            .cache
            .fetch(key.clone(), move || {
                let pending = call(Arc::clone(&api));
                async move { pending.await.map(T::into_data) }
            })
            .await?;
        T::extract(&data).ok_or_else(|| {
            ServiceError::Internal(format!("cached data for {key} has an unexpected shape"))
        })
    }

    // ── Site views ────────────────────────────────────────────────────────

    pub async fn site_analytics(&self, site_id: &str) -> Result<Arc<SiteAnalytics>, ServiceError> {
        let id = site_id.to_string();
        self.run(QueryKey::SiteAnalytics(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_site_analytics(&id).await }
        })
        .await
    }

    pub async fn site_trials(&self, site_id: &str) -> Result<Arc<SiteTrialsResponse>, ServiceError> {
        let id = site_id.to_string();
        self.run(QueryKey::SiteTrials(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_site_trials(&id).await }
        })
        .await
    }

    pub async fn site_invitations(
        &self,
        site_id: &str,
    ) -> Result<Arc<SitePendingInvitationsResponse>, ServiceError> {
        let id = site_id.to_string();
        self.run(QueryKey::SiteInvitations(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_site_pending_invitations(&id).await }
        })
        .await
    }

    pub async fn site_trial_documents(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<Arc<SiteTrialDocumentsResponse>, ServiceError> {
        let (site, trial) = (site_id.to_string(), trial_id.to_string());
        let key = QueryKey::SiteTrialDocuments {
            site_id: site.clone(),
            trial_id: trial.clone(),
        };
        self.run(key, move |api| {
            let (site, trial) = (site.clone(), trial.clone());
            async move { api.get_site_trial_documents(&site, &trial).await }
        })
        .await
    }

    pub async fn matching_trials(
        &self,
        site_id: &str,
    ) -> Result<Arc<MatchingTrialsResponse>, ServiceError> {
        let id = site_id.to_string();
        self.run(QueryKey::MatchingTrials(id.clone()), move |api| {
            let id = id.clone();
            async move { api.find_matching_trials(&id).await }
        })
        .await
    }

    // ── Sponsor views ─────────────────────────────────────────────────────

    pub async fn sponsor_details(
        &self,
        sponsor_id: &str,
    ) -> Result<Arc<SponsorDetailsResponse>, ServiceError> {
        let id = sponsor_id.to_string();
        self.run(QueryKey::SponsorDetails(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_sponsor_details(&id).await }
        })
        .await
    }

    pub async fn sponsor_invitations(
        &self,
        sponsor_id: &str,
    ) -> Result<Arc<SponsorPendingInvitationsResponse>, ServiceError> {
        let id = sponsor_id.to_string();
        self.run(QueryKey::SponsorInvitations(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_sponsor_pending_invitations(&id).await }
        })
        .await
    }

    // ── Trial views ───────────────────────────────────────────────────────

    pub async fn trial_details(&self, trial_id: &str) -> Result<Arc<Trial>, ServiceError> {
        let id = trial_id.to_string();
        self.run(QueryKey::TrialDetails(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_trial_details(&id).await }
        })
        .await
    }

    pub async fn trial_sites(&self, trial_id: &str) -> Result<Arc<TrialSitesResponse>, ServiceError> {
        let id = trial_id.to_string();
        self.run(QueryKey::TrialSites(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_trial_sites(&id).await }
        })
        .await
    }

    pub async fn trial_with_sites(
        &self,
        trial_id: &str,
    ) -> Result<Arc<TrialWithSitesResponse>, ServiceError> {
        let id = trial_id.to_string();
        self.run(QueryKey::TrialWithSites(id.clone()), move |api| {
            let id = id.clone();
            async move { api.get_trial_with_sites(&id).await }
        })
        .await
    }

    pub async fn matching_sites(
        &self,
        trial_id: &str,
    ) -> Result<Arc<MatchingSitesResponse>, ServiceError> {
        let id = trial_id.to_string();
        self.run(QueryKey::MatchingSites(id.clone()), move |api| {
            let id = id.clone();
            async move { api.find_matching_sites(&id).await }
        })
        .await
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    pub async fn accept_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.mutate(Mutation::AcceptTrialInvitation {
            site_id: site_id.to_string(),
            trial_id: trial_id.to_string(),
        })
        .await
    }

    pub async fn decline_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.mutate(Mutation::DeclineTrialInvitation {
            site_id: site_id.to_string(),
            trial_id: trial_id.to_string(),
        })
        .await
    }

    pub async fn accept_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.mutate(Mutation::AcceptSiteInvitation {
            trial_id: trial_id.to_string(),
            site_id: site_id.to_string(),
        })
        .await
    }

    pub async fn decline_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.mutate(Mutation::DeclineSiteInvitation {
            trial_id: trial_id.to_string(),
            site_id: site_id.to_string(),
        })
        .await
    }

    /// Run `mutation`; on success mark every query it affects stale.
    pub async fn mutate(&self, mutation: Mutation) -> Result<MutationResponse, ServiceError> {
        let response = match &mutation {
            Mutation::AcceptTrialInvitation { site_id, trial_id } => {
                self.api.accept_trial_invitation(site_id, trial_id).await
            }
            Mutation::DeclineTrialInvitation { site_id, trial_id } => {
                self.api.decline_trial_invitation(site_id, trial_id).await
            }
            Mutation::AcceptSiteInvitation { trial_id, site_id } => {
                self.api.accept_site_invitation(trial_id, site_id).await
            }
            Mutation::DeclineSiteInvitation { trial_id, site_id } => {
                self.api.decline_site_invitation(trial_id, site_id).await
            }
        };
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!(%mutation, error = %e, "mutation failed, nothing invalidated");
                return Err(e);
            }
        };

        let invalidated = self.cache.invalidate_where(|key| mutation.affects(key));
        info!(%mutation, invalidated, "{}", response.message);
        Ok(response)
    }
}
