//! In-memory stand-in for the TrialDesk backend database.
//!
//! Lookups are synchronous and return `Option`/`Vec`; turning absence into an
//! error is the facade's job. Invitation answers genuinely change state so
//! that invalidate-then-refetch shows the new data.

pub mod fixtures;

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;
use trialdesk_core::{
    Document, Invitation, InvitationDirection, MatchRecord, Site, SiteAnalytics, SiteTrial,
    Sponsor, Trial,
};

pub use fixtures::{AnalyticsTemplate, FixtureError, MockData};

/// What answering an invitation did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationOutcome {
    /// A pending invitation existed and was consumed.
    Resolved,
    /// Nothing was pending for the pair; the store is unchanged.
    NothingPending,
}

/// Mock database shared by the facade and the server.
/// Thread-safe: wraps the records in a Mutex so it can be shared via `Arc<MockDb>`.
pub struct MockDb {
    data: Mutex<MockData>,
}

impl MockDb {
    /// Open a store seeded with the embedded fixture set.
    pub fn seeded() -> Result<Self, FixtureError> {
        Ok(Self::from_data(MockData::seed()?))
    }

    /// Open a store over already-checked records.
    pub fn from_data(data: MockData) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Accounts ──────────────────────────────────────────────────────────

    pub fn site(&self, site_id: &str) -> Option<Site> {
        self.data().sites.iter().find(|s| s.id == site_id).cloned()
    }

    pub fn site_by_number(&self, number: u32) -> Option<Site> {
        self.data().sites.iter().find(|s| s.number == number).cloned()
    }

    pub fn sponsor(&self, sponsor_id: &str) -> Option<Sponsor> {
        self.data()
            .sponsors
            .iter()
            .find(|s| s.id == sponsor_id)
            .cloned()
    }

    pub fn sponsor_by_number(&self, number: u32) -> Option<Sponsor> {
        self.data()
            .sponsors
            .iter()
            .find(|s| s.number == number)
            .cloned()
    }

    // ── Trials ────────────────────────────────────────────────────────────

    pub fn trial(&self, trial_id: &str) -> Option<Trial> {
        self.data().trials.iter().find(|t| t.id == trial_id).cloned()
    }

    pub fn trials_for_sponsor(&self, sponsor_id: &str) -> Vec<Trial> {
        self.data()
            .trials
            .iter()
            .filter(|t| t.sponsor_id == sponsor_id)
            .cloned()
            .collect()
    }

    /// Trials a site participates in, paired with the membership record.
    pub fn trials_for_site(&self, site_id: &str) -> Vec<(SiteTrial, Trial)> {
        let data = self.data();
        data.site_trials
            .iter()
            .filter(|st| st.site_id == site_id)
            .filter_map(|st| {
                let trial = data.trials.iter().find(|t| t.id == st.trial_id)?;
                Some((st.clone(), trial.clone()))
            })
            .collect()
    }

    /// Sites participating in a trial, paired with the membership record.
    pub fn sites_for_trial(&self, trial_id: &str) -> Vec<(SiteTrial, Site)> {
        let data = self.data();
        data.site_trials
            .iter()
            .filter(|st| st.trial_id == trial_id)
            .filter_map(|st| {
                let site = data.sites.iter().find(|s| s.id == st.site_id)?;
                Some((st.clone(), site.clone()))
            })
            .collect()
    }

    pub fn site_trial(&self, site_id: &str, trial_id: &str) -> Option<SiteTrial> {
        self.data()
            .site_trials
            .iter()
            .find(|st| st.site_id == site_id && st.trial_id == trial_id)
            .cloned()
    }

    pub fn documents(&self, site_trial_id: &str) -> Vec<Document> {
        self.data()
            .documents
            .iter()
            .filter(|d| d.site_trial_id == site_trial_id)
            .cloned()
            .collect()
    }

    pub fn analytics(&self, site_id: &str) -> Option<SiteAnalytics> {
        let data = self.data();
        data.sites
            .iter()
            .any(|s| s.id == site_id)
            .then(|| data.analytics_template.for_site(site_id))
    }

    // ── Invitations ───────────────────────────────────────────────────────

    /// Sponsor invitations waiting on a site, oldest first.
    pub fn pending_for_site(&self, site_id: &str) -> Vec<(Invitation, Trial)> {
        let data = self.data();
        let mut pending: Vec<_> = data
            .invitations
            .iter()
            .filter(|i| i.direction == InvitationDirection::TrialToSite && i.site_id == site_id)
            .filter_map(|i| {
                let trial = data.trials.iter().find(|t| t.id == i.trial_id)?;
                Some((i.clone(), trial.clone()))
            })
            .collect();
        pending.sort_by(|a, b| a.0.date_requested.cmp(&b.0.date_requested));
        pending
    }

    /// Site requests waiting on any trial owned by the sponsor, oldest first.
    pub fn pending_for_sponsor(&self, sponsor_id: &str) -> Vec<(Invitation, Trial, Site)> {
        let data = self.data();
        let mut pending: Vec<_> = data
            .invitations
            .iter()
            .filter(|i| i.direction == InvitationDirection::SiteToTrial)
            .filter_map(|i| {
                let trial = data
                    .trials
                    .iter()
                    .find(|t| t.id == i.trial_id && t.sponsor_id == sponsor_id)?;
                let site = data.sites.iter().find(|s| s.id == i.site_id)?;
                Some((i.clone(), trial.clone(), site.clone()))
            })
            .collect();
        pending.sort_by(|a, b| a.0.date_requested.cmp(&b.0.date_requested));
        pending
    }

    /// Consume a pending invitation and put the site on the trial.
    ///
    /// Returns `None` when the site or trial does not exist.
    pub fn accept_invitation(
        &self,
        direction: InvitationDirection,
        site_id: &str,
        trial_id: &str,
    ) -> Option<InvitationOutcome> {
        let mut data = self.data();
        if !pair_exists(&data, site_id, trial_id) {
            return None;
        }
        if !take_invitation(&mut data, direction, site_id, trial_id) {
            debug!(site_id, trial_id, ?direction, "accept: nothing pending");
            return Some(InvitationOutcome::NothingPending);
        }

        let already_linked = data
            .site_trials
            .iter()
            .any(|st| st.site_id == site_id && st.trial_id == trial_id);
        if !already_linked {
            data.site_trials.push(SiteTrial {
                id: SiteTrial::id_for(site_id, trial_id),
                site_id: site_id.to_string(),
                trial_id: trial_id.to_string(),
                enrolled_patients: 0,
            });
        }
        // The pair is settled, so an answer still pending the other way is moot.
        data.invitations
            .retain(|i| !(i.site_id == site_id && i.trial_id == trial_id));
        // A site on the trial is no longer a match candidate for it.
        data.matches
            .retain(|m| !(m.site_id == site_id && m.trial_id == trial_id));
        debug!(site_id, trial_id, ?direction, "accept: site linked to trial");
        Some(InvitationOutcome::Resolved)
    }

    /// Drop a pending invitation. Returns `None` when the site or trial does not exist.
    pub fn decline_invitation(
        &self,
        direction: InvitationDirection,
        site_id: &str,
        trial_id: &str,
    ) -> Option<InvitationOutcome> {
        let mut data = self.data();
        if !pair_exists(&data, site_id, trial_id) {
            return None;
        }
        if take_invitation(&mut data, direction, site_id, trial_id) {
            debug!(site_id, trial_id, ?direction, "decline: invitation removed");
            Some(InvitationOutcome::Resolved)
        } else {
            debug!(site_id, trial_id, ?direction, "decline: nothing pending");
            Some(InvitationOutcome::NothingPending)
        }
    }

    // ── Matching ──────────────────────────────────────────────────────────

    /// Precomputed trial matches for a site, best score first.
    pub fn matches_for_site(&self, site_id: &str) -> Vec<(MatchRecord, Trial)> {
        let data = self.data();
        let mut matches: Vec<_> = data
            .matches
            .iter()
            .filter(|m| m.site_id == site_id)
            .filter_map(|m| {
                let trial = data.trials.iter().find(|t| t.id == m.trial_id)?;
                Some((m.clone(), trial.clone()))
            })
            .collect();
        matches.sort_by(|a, b| b.0.compatibility_score.cmp(&a.0.compatibility_score));
        matches
    }

    /// Precomputed site matches for a trial, best score first.
    pub fn matches_for_trial(&self, trial_id: &str) -> Vec<(MatchRecord, Site)> {
        let data = self.data();
        let mut matches: Vec<_> = data
            .matches
            .iter()
            .filter(|m| m.trial_id == trial_id)
            .filter_map(|m| {
                let site = data.sites.iter().find(|s| s.id == m.site_id)?;
                Some((m.clone(), site.clone()))
            })
            .collect();
        matches.sort_by(|a, b| b.0.compatibility_score.cmp(&a.0.compatibility_score));
        matches
    }
}

fn pair_exists(data: &MockData, site_id: &str, trial_id: &str) -> bool {
    data.sites.iter().any(|s| s.id == site_id) && data.trials.iter().any(|t| t.id == trial_id)
}

fn take_invitation(
    data: &mut MockData,
    direction: InvitationDirection,
    site_id: &str,
    trial_id: &str,
) -> bool {
    let before = data.invitations.len();
    data.invitations.retain(|i| {
        !(i.direction == direction && i.site_id == site_id && i.trial_id == trial_id)
    });
    data.invitations.len() != before
}
