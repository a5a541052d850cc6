use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Regulatory document attached to a site/trial pairing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub site_trial_id: String,
    pub document_type: String,
    pub status: DocumentStatus,
    pub document_url: String,
    pub updated_at: DateTime<Utc>,
}

/// Signature workflow position of a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    PendingSiteReview,
    PendingTrialReview,
    SiteSigned,
    TrialSigned,
    Completed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingSiteReview => "pending_site_review",
            Self::PendingTrialReview => "pending_trial_review",
            Self::SiteSigned => "site_signed",
            Self::TrialSigned => "trial_signed",
            Self::Completed => "completed",
        }
    }

    /// Whether the site still owes an action on this document.
    pub fn awaits_site(&self) -> bool {
        matches!(self, Self::Draft | Self::PendingSiteReview | Self::TrialSigned)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_snake_case() {
        for (status, wire) in [
            (DocumentStatus::PendingSiteReview, "pending_site_review"),
            (DocumentStatus::TrialSigned, "trial_signed"),
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{wire}\""));
            assert_eq!(status.as_str(), wire);
        }
    }

    #[test]
    fn site_owes_action_until_it_signs() {
        assert!(DocumentStatus::Draft.awaits_site());
        assert!(DocumentStatus::TrialSigned.awaits_site());
        assert!(!DocumentStatus::SiteSigned.awaits_site());
        assert!(!DocumentStatus::Completed.awaits_site());
        assert!(DocumentStatus::Completed.is_completed());
    }
}
