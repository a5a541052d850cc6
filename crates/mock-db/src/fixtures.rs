//! Canned records and their integrity checks.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use trialdesk_core::validate::{validate_analytics, validate_match, validate_trial, ValidationError};
use trialdesk_core::{
    Document, Invitation, MatchRecord, PatientStatistics, Site, SiteAnalytics, SiteReadiness,
    SiteTrial, Sponsor, StaffStatistics, Trial,
};

/// The fixture set shipped with the crate.
pub const SEED_JSON: &str = include_str!("../fixtures/mock_data.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FixtureError {
    #[error("fixture parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {kind} {id}: {}", join(.errors))]
    Invalid {
        kind: &'static str,
        id: String,
        errors: Vec<ValidationError>,
    },
    #[error("{kind} {id} references missing {target} {target_id}")]
    DanglingReference {
        kind: &'static str,
        id: String,
        target: &'static str,
        target_id: String,
    },
    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("{0}")]
    Inconsistent(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Analytics shared by every site; stamped with the site id on lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsTemplate {
    pub staff_statistics: StaffStatistics,
    pub site_readiness: SiteReadiness,
    pub patient_statistics: PatientStatistics,
}

impl AnalyticsTemplate {
    pub fn for_site(&self, site_id: &str) -> SiteAnalytics {
        SiteAnalytics {
            site_id: site_id.to_string(),
            staff_statistics: self.staff_statistics.clone(),
            site_readiness: self.site_readiness.clone(),
            patient_statistics: self.patient_statistics.clone(),
        }
    }
}

/// Every record the mock backend knows about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockData {
    pub sites: Vec<Site>,
    pub sponsors: Vec<Sponsor>,
    pub trials: Vec<Trial>,
    pub site_trials: Vec<SiteTrial>,
    pub invitations: Vec<Invitation>,
    pub analytics_template: AnalyticsTemplate,
    pub documents: Vec<Document>,
    pub matches: Vec<MatchRecord>,
}

impl MockData {
    /// Parse the embedded fixture set and check it.
    pub fn seed() -> Result<Self, FixtureError> {
        Self::from_json(SEED_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let data: Self = serde_json::from_str(json)?;
        data.check()?;
        Ok(data)
    }

    /// Reject records that break shape rules or point at missing records.
    pub fn check(&self) -> Result<(), FixtureError> {
        let site_ids = unique_ids("site", self.sites.iter().map(|s| s.id.as_str()))?;
        unique_ids("site number", self.sites.iter().map(|s| s.number.to_string()))?;
        let sponsor_ids = unique_ids("sponsor", self.sponsors.iter().map(|s| s.id.as_str()))?;
        unique_ids(
            "sponsor number",
            self.sponsors.iter().map(|s| s.number.to_string()),
        )?;
        let trial_ids = unique_ids("trial", self.trials.iter().map(|t| t.id.as_str()))?;

        for trial in &self.trials {
            validate_trial(trial).map_err(|errors| FixtureError::Invalid {
                kind: "trial",
                id: trial.id.clone(),
                errors,
            })?;
            require(&sponsor_ids, "trial", &trial.id, "sponsor", &trial.sponsor_id)?;
            let sponsor = self.sponsors.iter().find(|s| s.id == trial.sponsor_id);
            if sponsor.is_some_and(|s| s.name != trial.sponsor_name) {
                return Err(FixtureError::Inconsistent(format!(
                    "trial {} carries sponsor_name {:?} that does not match {}",
                    trial.id, trial.sponsor_name, trial.sponsor_id
                )));
            }
        }

        let mut linked = HashSet::new();
        for st in &self.site_trials {
            require(&site_ids, "site_trial", &st.id, "site", &st.site_id)?;
            require(&trial_ids, "site_trial", &st.id, "trial", &st.trial_id)?;
            if st.id != SiteTrial::id_for(&st.site_id, &st.trial_id) {
                return Err(FixtureError::Inconsistent(format!(
                    "site_trial id {} does not follow st_<site>_<trial>",
                    st.id
                )));
            }
            if !linked.insert((st.site_id.as_str(), st.trial_id.as_str())) {
                return Err(FixtureError::Duplicate {
                    kind: "site_trial",
                    id: st.id.clone(),
                });
            }
        }
        let site_trial_ids: HashSet<&str> = self.site_trials.iter().map(|st| st.id.as_str()).collect();

        for inv in &self.invitations {
            let id = format!("{}->{}", inv.trial_id, inv.site_id);
            require(&site_ids, "invitation", &id, "site", &inv.site_id)?;
            require(&trial_ids, "invitation", &id, "trial", &inv.trial_id)?;
            if linked.contains(&(inv.site_id.as_str(), inv.trial_id.as_str())) {
                return Err(FixtureError::Inconsistent(format!(
                    "invitation {id} is pending for a site already on the trial"
                )));
            }
            if let Some(score) = inv.compatibility_score.filter(|s| *s > 100) {
                return Err(FixtureError::Invalid {
                    kind: "invitation",
                    id,
                    errors: vec![ValidationError::PercentOutOfRange {
                        field: "compatibility_score".into(),
                        value: u32::from(score),
                    }],
                });
            }
        }

        for doc in &self.documents {
            require(&site_trial_ids, "document", &doc.id, "site_trial", &doc.site_trial_id)?;
        }

        for record in &self.matches {
            let id = format!("{}~{}", record.site_id, record.trial_id);
            validate_match(record).map_err(|errors| FixtureError::Invalid {
                kind: "match",
                id: id.clone(),
                errors,
            })?;
            require(&site_ids, "match", &id, "site", &record.site_id)?;
            require(&trial_ids, "match", &id, "trial", &record.trial_id)?;
        }

        validate_analytics(&self.analytics_template.for_site("template")).map_err(|errors| {
            FixtureError::Invalid {
                kind: "analytics",
                id: "template".into(),
                errors,
            }
        })?;

        Ok(())
    }
}

fn unique_ids<'a, S>(kind: &'static str, ids: impl Iterator<Item = S>) -> Result<HashSet<String>, FixtureError>
where
    S: Into<std::borrow::Cow<'a, str>>,
{
    let mut seen = HashSet::new();
    for id in ids {
        let id = id.into().into_owned();
        if !seen.insert(id.clone()) {
            return Err(FixtureError::Duplicate { kind, id });
        }
    }
    Ok(seen)
}

fn require<S: std::borrow::Borrow<str> + Eq + std::hash::Hash>(
    known: &HashSet<S>,
    kind: &'static str,
    id: &str,
    target: &'static str,
    target_id: &str,
) -> Result<(), FixtureError> {
    if known.contains(target_id) {
        Ok(())
    } else {
        Err(FixtureError::DanglingReference {
            kind,
            id: id.to_string(),
            target,
            target_id: target_id.to_string(),
        })
    }
}
