//! In-process facade backed by [`MockDb`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use trialdesk_api::{
    Account, MatchingSite, MatchingSitesResponse, MatchingTrial, MatchingTrialsResponse,
    MutationResponse, ServiceError, SiteAnalytics, SiteInvitation, SitePendingInvitationsResponse,
    SiteTrialDocumentsResponse, SiteTrialSummary, SiteTrialsResponse, SponsorDetailsResponse,
    SponsorInvitation, SponsorPendingInvitationsResponse, Trial, TrialSite, TrialSitesResponse,
    TrialWithSitesResponse, User,
};
use trialdesk_core::InvitationDirection;
use trialdesk_mock_db::{FixtureError, InvitationOutcome, MockDb};

use crate::facade::TrialApi;
use crate::latency::LatencySimulator;

/// Answers every facade call from the mock store after the simulated delay.
#[derive(Clone)]
pub struct MockApi {
    db: Arc<MockDb>,
    latency: LatencySimulator,
}

impl MockApi {
    pub fn new(db: Arc<MockDb>, latency: LatencySimulator) -> Self {
        Self { db, latency }
    }

    /// Fresh store over the shipped fixtures with the default 800 ms delay.
    pub fn seeded() -> Result<Self, FixtureError> {
        Ok(Self::new(Arc::new(MockDb::seeded()?), LatencySimulator::default()))
    }

    pub fn with_latency(mut self, latency: LatencySimulator) -> Self {
        self.latency = latency;
        self
    }

    pub fn db(&self) -> &Arc<MockDb> {
        &self.db
    }

    pub fn latency(&self) -> LatencySimulator {
        self.latency
    }

    fn require_site(&self, site_id: &str) -> Result<(), ServiceError> {
        match self.db.site(site_id) {
            Some(_) => Ok(()),
            None => Err(ServiceError::missing("site", site_id)),
        }
    }

    fn require_trial(&self, trial_id: &str) -> Result<Trial, ServiceError> {
        self.db
            .trial(trial_id)
            .ok_or_else(|| ServiceError::missing("trial", trial_id))
    }

    fn trial_sites(&self, trial_id: &str) -> Vec<TrialSite> {
        self.db
            .sites_for_trial(trial_id)
            .into_iter()
            .map(|(st, site)| TrialSite {
                site_id: site.id,
                site_name: site.name,
                location: site.location,
                site_trial_id: st.id,
                enrolled_patients: st.enrolled_patients,
            })
            .collect()
    }

    fn answer(
        &self,
        accept: bool,
        direction: InvitationDirection,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        let outcome = if accept {
            self.db.accept_invitation(direction, site_id, trial_id)
        } else {
            self.db.decline_invitation(direction, site_id, trial_id)
        };
        let Some(outcome) = outcome else {
            self.require_site(site_id)?;
            return Err(ServiceError::missing("trial", trial_id));
        };

        let verb = if accept { "accepted" } else { "declined" };
        let message = match outcome {
            InvitationOutcome::Resolved => format!("Invitation {verb}"),
            InvitationOutcome::NothingPending => {
                format!("Invitation {verb} (no pending invitation for this pair)")
            }
        };
        Ok(MutationResponse::ok(message))
    }
}

#[async_trait]
impl TrialApi for MockApi {
    async fn login_site(&self, number: u32) -> Result<User, ServiceError> {
        self.latency.wait().await;
        debug!(number, "login_site");
        let site = self
            .db
            .site_by_number(number)
            .ok_or_else(|| ServiceError::missing("site number", number))?;
        Ok(User::Site(Account {
            id: site.id,
            name: site.name,
            number: site.number,
        }))
    }

    async fn login_sponsor(&self, number: u32) -> Result<User, ServiceError> {
        self.latency.wait().await;
        debug!(number, "login_sponsor");
        let sponsor = self
            .db
            .sponsor_by_number(number)
            .ok_or_else(|| ServiceError::missing("sponsor number", number))?;
        Ok(User::Sponsor(Account {
            id: sponsor.id,
            name: sponsor.name,
            number: sponsor.number,
        }))
    }

    async fn get_site_analytics(&self, site_id: &str) -> Result<SiteAnalytics, ServiceError> {
        self.latency.wait().await;
        debug!(site_id, "get_site_analytics");
        self.db
            .analytics(site_id)
            .ok_or_else(|| ServiceError::missing("site", site_id))
    }

    async fn get_site_trials(&self, site_id: &str) -> Result<SiteTrialsResponse, ServiceError> {
        self.latency.wait().await;
        debug!(site_id, "get_site_trials");
        self.require_site(site_id)?;
        let trials = self
            .db
            .trials_for_site(site_id)
            .into_iter()
            .map(|(st, trial)| SiteTrialSummary {
                site_trial_id: st.id,
                trial,
                enrolled_patients: st.enrolled_patients,
            })
            .collect();
        Ok(SiteTrialsResponse {
            site_id: site_id.to_string(),
            trials,
        })
    }

    async fn get_site_pending_invitations(
        &self,
        site_id: &str,
    ) -> Result<SitePendingInvitationsResponse, ServiceError> {
        self.latency.wait().await;
        debug!(site_id, "get_site_pending_invitations");
        self.require_site(site_id)?;
        let pending_invitations: Vec<_> = self
            .db
            .pending_for_site(site_id)
            .into_iter()
            .map(|(inv, trial)| SiteInvitation {
                trial_id: trial.id,
                trial_name: trial.name,
                sponsor_id: trial.sponsor_id,
                sponsor_name: trial.sponsor_name,
                compatibility_score: inv.compatibility_score,
                date_requested: inv.date_requested,
            })
            .collect();
        Ok(SitePendingInvitationsResponse {
            site_id: site_id.to_string(),
            total_count: pending_invitations.len(),
            pending_invitations,
        })
    }

    async fn find_matching_trials(
        &self,
        site_id: &str,
    ) -> Result<MatchingTrialsResponse, ServiceError> {
        self.latency.wait().await;
        debug!(site_id, "find_matching_trials");
        self.require_site(site_id)?;
        let matching_trials = self
            .db
            .matches_for_site(site_id)
            .into_iter()
            .map(|(m, trial)| MatchingTrial {
                trial_id: trial.id,
                trial_name: trial.name,
                sponsor_id: trial.sponsor_id,
                sponsor_name: trial.sponsor_name,
                phase: trial.phase,
                status: trial.status,
                compatibility_score: m.compatibility_score,
                eligible_patients: m.eligible_patients,
                total_patients: m.total_patients,
            })
            .collect();
        Ok(MatchingTrialsResponse {
            site_id: site_id.to_string(),
            matching_trials,
        })
    }

    async fn get_site_trial_documents(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<SiteTrialDocumentsResponse, ServiceError> {
        self.latency.wait().await;
        debug!(site_id, trial_id, "get_site_trial_documents");
        self.require_site(site_id)?;
        self.require_trial(trial_id)?;
        let st = self.db.site_trial(site_id, trial_id).ok_or_else(|| {
            ServiceError::NotFound(format!("site {site_id} is not on trial {trial_id}"))
        })?;
        Ok(SiteTrialDocumentsResponse {
            documents: self.db.documents(&st.id),
            site_trial_id: st.id,
            site_id: st.site_id,
            trial_id: st.trial_id,
        })
    }

    async fn get_sponsor_details(
        &self,
        sponsor_id: &str,
    ) -> Result<SponsorDetailsResponse, ServiceError> {
        self.latency.wait().await;
        debug!(sponsor_id, "get_sponsor_details");
        let sponsor = self
            .db
            .sponsor(sponsor_id)
            .ok_or_else(|| ServiceError::missing("sponsor", sponsor_id))?;
        Ok(SponsorDetailsResponse {
            trials: self.db.trials_for_sponsor(&sponsor.id),
            id: sponsor.id,
            name: sponsor.name,
            number: sponsor.number,
        })
    }

    async fn get_sponsor_pending_invitations(
        &self,
        sponsor_id: &str,
    ) -> Result<SponsorPendingInvitationsResponse, ServiceError> {
        self.latency.wait().await;
        debug!(sponsor_id, "get_sponsor_pending_invitations");
        if self.db.sponsor(sponsor_id).is_none() {
            return Err(ServiceError::missing("sponsor", sponsor_id));
        }
        let pending_invitations: Vec<_> = self
            .db
            .pending_for_sponsor(sponsor_id)
            .into_iter()
            .map(|(inv, trial, site)| SponsorInvitation {
                trial_id: trial.id,
                trial_name: trial.name,
                site_id: site.id,
                site_name: site.name,
                compatibility_score: inv.compatibility_score,
                date_requested: inv.date_requested,
            })
            .collect();
        Ok(SponsorPendingInvitationsResponse {
            sponsor_id: sponsor_id.to_string(),
            total_count: pending_invitations.len(),
            pending_invitations,
        })
    }

    async fn get_trial_details(&self, trial_id: &str) -> Result<Trial, ServiceError> {
        self.latency.wait().await;
        debug!(trial_id, "get_trial_details");
        self.require_trial(trial_id)
    }

    async fn get_trial_sites(&self, trial_id: &str) -> Result<TrialSitesResponse, ServiceError> {
        self.latency.wait().await;
        debug!(trial_id, "get_trial_sites");
        self.require_trial(trial_id)?;
        Ok(TrialSitesResponse {
            trial_id: trial_id.to_string(),
            sites: self.trial_sites(trial_id),
        })
    }

    async fn get_trial_with_sites(
        &self,
        trial_id: &str,
    ) -> Result<TrialWithSitesResponse, ServiceError> {
        self.latency.wait().await;
        debug!(trial_id, "get_trial_with_sites");
        let trial = self.require_trial(trial_id)?;
        Ok(TrialWithSitesResponse {
            trial_id: trial_id.to_string(),
            sites: self.trial_sites(trial_id),
            trial,
        })
    }

    async fn find_matching_sites(
        &self,
        trial_id: &str,
    ) -> Result<MatchingSitesResponse, ServiceError> {
        self.latency.wait().await;
        debug!(trial_id, "find_matching_sites");
        self.require_trial(trial_id)?;
        let matching_sites = self
            .db
            .matches_for_trial(trial_id)
            .into_iter()
            .map(|(m, site)| MatchingSite {
                site_id: site.id,
                site_name: site.name,
                location: site.location,
                compatibility_score: m.compatibility_score,
                eligible_patients: m.eligible_patients,
                total_patients: m.total_patients,
            })
            .collect();
        Ok(MatchingSitesResponse {
            trial_id: trial_id.to_string(),
            matching_sites,
        })
    }

    async fn accept_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.latency.wait().await;
        debug!(site_id, trial_id, "accept_trial_invitation");
        self.answer(true, InvitationDirection::TrialToSite, site_id, trial_id)
    }

    async fn decline_trial_invitation(
        &self,
        site_id: &str,
        trial_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.latency.wait().await;
        debug!(site_id, trial_id, "decline_trial_invitation");
        self.answer(false, InvitationDirection::TrialToSite, site_id, trial_id)
    }

    async fn accept_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.latency.wait().await;
        debug!(trial_id, site_id, "accept_site_invitation");
        self.answer(true, InvitationDirection::SiteToTrial, site_id, trial_id)
    }

    async fn decline_site_invitation(
        &self,
        trial_id: &str,
        site_id: &str,
    ) -> Result<MutationResponse, ServiceError> {
        self.latency.wait().await;
        debug!(trial_id, site_id, "decline_site_invitation");
        self.answer(false, InvitationDirection::SiteToTrial, site_id, trial_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use trialdesk_api::{Identity, Role};
    use tokio::time::Instant;

    fn api() -> MockApi {
        MockApi::new(Arc::new(MockDb::seeded().unwrap()), LatencySimulator::none())
    }

    #[tokio::test]
    async fn every_site_number_logs_in_as_its_own_record() {
        let api = api();
        for n in 0..10 {
            let user = api.login_site(n).await.unwrap();
            assert_eq!(user.role(), Role::Site);
            assert_eq!(user.number(), n);
            assert_eq!(user.id(), format!("site_{n}"));
        }
        for n in [10, 11, 99, u32::MAX] {
            assert!(api.login_site(n).await.unwrap_err().is_not_found());
        }
    }

    #[tokio::test]
    async fn every_sponsor_number_logs_in_as_its_own_record() {
        let api = api();
        for n in 0..3 {
            let user = api.login_sponsor(n).await.unwrap();
            assert_eq!(user.role(), Role::Sponsor);
            assert_eq!(user.number(), n);
        }
        for n in [3, 4, 100] {
            assert!(api.login_sponsor(n).await.unwrap_err().is_not_found());
        }
    }

    #[tokio::test]
    async fn login_dispatches_on_role() {
        let api = api();
        let user = api.login(Identity::sponsor(1)).await.unwrap();
        assert!(matches!(user, User::Sponsor(_)));
        let user = api.login(Identity::default()).await.unwrap();
        assert_eq!(user.id(), "site_0");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn calls_resolve_after_the_simulated_delay() {
        let api = MockApi::seeded().unwrap();
        let start = Instant::now();
        api.get_trial_details("trial_0").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(800));

        let start = Instant::now();
        api.get_trial_details("trial_404").await.unwrap_err();
        assert_eq!(start.elapsed(), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn site_analytics_returns_the_fixture_unmodified() {
        let analytics = api().get_site_analytics("site_0").await.unwrap();
        assert_eq!(analytics.site_id, "site_0");
        assert_eq!(analytics.staff_statistics.total_staff, 16);
        let sum: u32 = analytics
            .staff_statistics
            .role_distribution
            .iter()
            .map(|r| r.count)
            .sum();
        assert_eq!(sum, 16);
    }

    #[tokio::test]
    async fn matching_trials_are_well_formed_for_every_site() {
        let api = api();
        for n in 0..10 {
            let site_id = format!("site_{n}");
            let resp = api.find_matching_trials(&site_id).await.unwrap();
            assert!(!resp.matching_trials.is_empty(), "{site_id} has no matches");
            for m in &resp.matching_trials {
                assert!(m.compatibility_score <= 100);
                assert!(m.eligible_patients <= m.total_patients);
            }
            assert!(
                resp.matching_trials
                    .windows(2)
                    .all(|w| w[0].compatibility_score >= w[1].compatibility_score)
            );
        }
    }

    #[tokio::test]
    async fn matching_trials_for_an_arbitrary_id_is_not_found() {
        let api = api();
        let err = api.find_matching_trials("any_site_id").await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound("site not found: any_site_id".into()));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let api = api();
        assert!(api.get_site_trials("site_x").await.unwrap_err().is_not_found());
        assert!(api.find_matching_trials("site_x").await.unwrap_err().is_not_found());
        assert!(api.get_sponsor_details("sponsor_x").await.unwrap_err().is_not_found());
        assert!(api.find_matching_sites("trial_x").await.unwrap_err().is_not_found());
        let err = api.accept_trial_invitation("site_0", "trial_x").await.unwrap_err();
        assert_eq!(err.message(), "trial not found: trial_x");
    }

    #[tokio::test]
    async fn accept_then_decline_both_succeed() {
        let api = api();
        let accepted = api.accept_trial_invitation("site_0", "trial_1").await.unwrap();
        assert!(accepted.success);
        let declined = api.decline_trial_invitation("site_0", "trial_1").await.unwrap();
        assert!(declined.success);
        let again = api.accept_trial_invitation("site_0", "trial_1").await.unwrap();
        assert!(again.success);
    }

    #[tokio::test]
    async fn accepting_a_sponsor_invitation_puts_the_site_on_the_trial() {
        let api = api();
        let before = api.get_site_pending_invitations("site_0").await.unwrap();
        assert!(before.pending_invitations.iter().any(|i| i.trial_id == "trial_1"));

        api.accept_trial_invitation("site_0", "trial_1").await.unwrap();

        let after = api.get_site_pending_invitations("site_0").await.unwrap();
        assert_eq!(after.total_count, before.total_count - 1);
        let trials = api.get_site_trials("site_0").await.unwrap();
        assert!(trials.trials.iter().any(|t| t.trial.id == "trial_1"));
        let sites = api.get_trial_sites("trial_1").await.unwrap();
        assert!(sites.sites.iter().any(|s| s.site_id == "site_0"));
    }

    #[tokio::test]
    async fn declining_a_site_request_clears_it_for_the_sponsor() {
        let api = api();
        let before = api.get_sponsor_pending_invitations("sponsor_0").await.unwrap();
        let request = before.pending_invitations[0].clone();

        api.decline_site_invitation(&request.trial_id, &request.site_id)
            .await
            .unwrap();

        let after = api.get_sponsor_pending_invitations("sponsor_0").await.unwrap();
        assert_eq!(after.total_count, before.total_count - 1);
        let sites = api.get_trial_sites(&request.trial_id).await.unwrap();
        assert!(sites.sites.iter().all(|s| s.site_id != request.site_id));
    }

    #[tokio::test]
    async fn documents_require_membership() {
        let api = api();
        let docs = api.get_site_trial_documents("site_0", "trial_0").await.unwrap();
        assert_eq!(docs.site_trial_id, "st_site_0_trial_0");
        assert!(docs.documents.iter().all(|d| d.site_trial_id == docs.site_trial_id));

        let err = api
            .get_site_trial_documents("site_0", "trial_1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn trial_with_sites_bundles_both_views() {
        let api = api();
        let bundle = api.get_trial_with_sites("trial_0").await.unwrap();
        let sites = api.get_trial_sites("trial_0").await.unwrap();
        assert_eq!(bundle.trial.id, "trial_0");
        assert_eq!(bundle.sites, sites.sites);
    }
}
