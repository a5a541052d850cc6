use crate::{
    AgeBucket, MatchRecord, PatientStatistics, ReadinessItem, RoleCount, SiteAnalytics,
    SiteReadiness, StaffStatistics, Trial, TrialPhase, TrialStatus,
};

/// Trial in enrollment with a 40-patient target (phase 2).
pub fn trial(id: &str, sponsor_id: &str) -> Trial {
    Trial {
        id: id.to_string(),
        name: format!("Test trial {id}"),
        phase: TrialPhase::Phase2,
        status: TrialStatus::Enrollment,
        sponsor_id: sponsor_id.to_string(),
        sponsor_name: format!("Sponsor {sponsor_id}"),
        enrollment_target: 40,
        current_enrollment: 12,
        therapeutic_area: "Oncology".to_string(),
        description: String::new(),
    }
}

/// Internally consistent analytics: 16 staff across four roles.
pub fn analytics(site_id: &str) -> SiteAnalytics {
    SiteAnalytics {
        site_id: site_id.to_string(),
        staff_statistics: StaffStatistics {
            total_staff: 16,
            active_staff: 14,
            role_distribution: vec![
                role("Principal Investigator", 2),
                role("Sub-Investigator", 4),
                role("Study Coordinator", 6),
                role("Research Nurse", 4),
            ],
            certifications_expiring: 3,
        },
        site_readiness: SiteReadiness {
            overall_score: 82,
            document_completion: 75,
            training_completion: 90,
            checklist: vec![ReadinessItem {
                item: "IRB approval".to_string(),
                complete: true,
            }],
        },
        patient_statistics: PatientStatistics {
            total_patients: 1200,
            eligible_patients: 340,
            enrolled_patients: 45,
            screening_in_progress: 18,
            age_distribution: vec![AgeBucket {
                range: "18-40".to_string(),
                count: 1200,
            }],
        },
    }
}

/// Match with 500 patients of which 120 are eligible.
pub fn match_record(site_id: &str, trial_id: &str, score: u8) -> MatchRecord {
    MatchRecord {
        site_id: site_id.to_string(),
        trial_id: trial_id.to_string(),
        compatibility_score: score,
        eligible_patients: 120,
        total_patients: 500,
    }
}

fn role(name: &str, count: u32) -> RoleCount {
    RoleCount {
        role: name.to_string(),
        count,
    }
}
