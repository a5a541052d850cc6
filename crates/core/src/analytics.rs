//! Precomputed per-site dashboard snapshot.
//!
//! None of these numbers are derived from other records; the analytics
//! payload is the canonical source for staff, readiness and patient counts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteAnalytics {
    pub site_id: String,
    pub staff_statistics: StaffStatistics,
    pub site_readiness: SiteReadiness,
    pub patient_statistics: PatientStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffStatistics {
    pub total_staff: u32,
    pub active_staff: u32,
    pub role_distribution: Vec<RoleCount>,
    pub certifications_expiring: u32,
}

impl StaffStatistics {
    pub fn role_total(&self) -> u32 {
        self.role_distribution.iter().map(|r| r.count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleCount {
    pub role: String,
    pub count: u32,
}

/// Readiness percentages (0–100) plus the checklist behind them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteReadiness {
    pub overall_score: u8,
    pub document_completion: u8,
    pub training_completion: u8,
    pub checklist: Vec<ReadinessItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessItem {
    pub item: String,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientStatistics {
    pub total_patients: u32,
    pub eligible_patients: u32,
    pub enrolled_patients: u32,
    pub screening_in_progress: u32,
    pub age_distribution: Vec<AgeBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeBucket {
    pub range: String,
    pub count: u32,
}
