use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A research site. Ten fixed records, numbered 0–9.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub location: String,
}

/// A trial sponsor. Three fixed records, numbered 0–2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sponsor {
    pub id: String,
    pub name: String,
    pub number: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    #[serde(rename = "phase_1")]
    Phase1,
    #[serde(rename = "phase_2")]
    Phase2,
    #[serde(rename = "phase_3")]
    Phase3,
    #[serde(rename = "phase_4")]
    Phase4,
}

impl TrialPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phase1 => "phase_1",
            Self::Phase2 => "phase_2",
            Self::Phase3 => "phase_3",
            Self::Phase4 => "phase_4",
        }
    }
}

impl std::fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage of a trial. Closed set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Enrollment,
    DocumentReview,
    Idle,
}

impl TrialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrollment => "enrollment",
            Self::DocumentReview => "document_review",
            Self::Idle => "idle",
        }
    }
}

impl std::fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trial {
    pub id: String,
    pub name: String,
    pub phase: TrialPhase,
    pub status: TrialStatus,
    pub sponsor_id: String,
    pub sponsor_name: String,
    pub enrollment_target: u32,
    pub current_enrollment: u32,
    pub therapeutic_area: String,
    pub description: String,
}

impl Trial {
    /// Enrollment progress as a whole percentage, capped at 100.
    pub fn enrollment_percent(&self) -> u8 {
        if self.enrollment_target == 0 {
            return 0;
        }
        let pct = u64::from(self.current_enrollment) * 100 / u64::from(self.enrollment_target);
        pct.min(100) as u8
    }
}

/// Membership of a site in a trial; the unit the enrollment and document
/// trackers hang off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteTrial {
    pub id: String,
    pub site_id: String,
    pub trial_id: String,
    pub enrolled_patients: u32,
}

impl SiteTrial {
    pub fn id_for(site_id: &str, trial_id: &str) -> String {
        format!("st_{site_id}_{trial_id}")
    }
}

/// Who asked whom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvitationDirection {
    /// A sponsor invited a site onto one of its trials; the site answers.
    TrialToSite,
    /// A site asked to join a trial; the sponsor answers.
    SiteToTrial,
}

/// A pending invitation between exactly one trial and exactly one site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invitation {
    pub trial_id: String,
    pub site_id: String,
    pub direction: InvitationDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<u8>,
    pub date_requested: NaiveDate,
}

/// Precomputed site/trial match. Nothing in this workspace scores matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    pub site_id: String,
    pub trial_id: String,
    pub compatibility_score: u8,
    pub eligible_patients: u32,
    pub total_patients: u32,
}
