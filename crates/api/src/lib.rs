//! Shared API payloads for TrialDesk.
//!
//! This crate is the **single source of truth** for every response shape the
//! dashboard consumes. The in-process mock facade, the HTTP client and the
//! Axum server all speak these types, so a real backend can replace the mock
//! without the UI noticing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod paths;

// Re-export core records for convenience
pub use trialdesk_core::{
    Account, Document, DocumentStatus, Identity, Role, Site, SiteAnalytics, Sponsor, Trial,
    TrialPhase, TrialStatus, User,
};

// ─── Sites ───────────────────────────────────────────────────────────────────

/// A trial as seen from one of its participating sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteTrialSummary {
    pub site_trial_id: String,
    #[serde(flatten)]
    pub trial: Trial,
    pub enrolled_patients: u32,
}

/// Returned by `GET /api/v1/sites/{site_id}/trials`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteTrialsResponse {
    pub site_id: String,
    pub trials: Vec<SiteTrialSummary>,
}

/// A sponsor's invitation waiting on the site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteInvitation {
    pub trial_id: String,
    pub trial_name: String,
    pub sponsor_id: String,
    pub sponsor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<u8>,
    pub date_requested: NaiveDate,
}

/// Returned by `GET /api/v1/sites/{site_id}/invitations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SitePendingInvitationsResponse {
    pub site_id: String,
    pub pending_invitations: Vec<SiteInvitation>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingTrial {
    pub trial_id: String,
    pub trial_name: String,
    pub sponsor_id: String,
    pub sponsor_name: String,
    pub phase: TrialPhase,
    pub status: TrialStatus,
    pub compatibility_score: u8,
    pub eligible_patients: u32,
    pub total_patients: u32,
}

/// Returned by `GET /api/v1/sites/{site_id}/matching-trials`, best match first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingTrialsResponse {
    pub site_id: String,
    pub matching_trials: Vec<MatchingTrial>,
}

/// Returned by `GET /api/v1/sites/{site_id}/trials/{trial_id}/documents`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteTrialDocumentsResponse {
    pub site_trial_id: String,
    pub site_id: String,
    pub trial_id: String,
    pub documents: Vec<Document>,
}

// ─── Sponsors ────────────────────────────────────────────────────────────────

/// Returned by `GET /api/v1/sponsors/{sponsor_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SponsorDetailsResponse {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub trials: Vec<Trial>,
}

/// A site's request to join one of the sponsor's trials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SponsorInvitation {
    pub trial_id: String,
    pub trial_name: String,
    pub site_id: String,
    pub site_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<u8>,
    pub date_requested: NaiveDate,
}

/// Returned by `GET /api/v1/sponsors/{sponsor_id}/invitations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SponsorPendingInvitationsResponse {
    pub sponsor_id: String,
    pub pending_invitations: Vec<SponsorInvitation>,
    pub total_count: usize,
}

// ─── Trials ──────────────────────────────────────────────────────────────────

/// A participating site as seen from the trial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialSite {
    pub site_id: String,
    pub site_name: String,
    pub location: String,
    pub site_trial_id: String,
    pub enrolled_patients: u32,
}

/// Returned by `GET /api/v1/trials/{trial_id}/sites`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialSitesResponse {
    pub trial_id: String,
    pub sites: Vec<TrialSite>,
}

/// Returned by `GET /api/v1/trials/{trial_id}/with-sites`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialWithSitesResponse {
    pub trial_id: String,
    pub trial: Trial,
    pub sites: Vec<TrialSite>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingSite {
    pub site_id: String,
    pub site_name: String,
    pub location: String,
    pub compatibility_score: u8,
    pub eligible_patients: u32,
    pub total_patients: u32,
}

/// Returned by `GET /api/v1/trials/{trial_id}/matching-sites`, best match first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingSitesResponse {
    pub trial_id: String,
    pub matching_sites: Vec<MatchingSite>,
}

// ─── Invitations ─────────────────────────────────────────────────────────────

/// Acknowledgement returned by every accept/decline endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ─── Health ──────────────────────────────────────────────────────────────────

/// Returned by `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code. The mock facade only ever
/// produces `NotFound`; the other variants exist for transports.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Internal(m) => m,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Rebuild an error from an HTTP status and message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            400..=499 => Self::BadRequest(message),
            _ => Self::Internal(message),
        }
    }

    /// `NotFound` for a missing record of the given kind.
    pub fn missing(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} not found: {id}"))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

// ─── Error (JSON shape) ─────────────────────────────────────────────────────

/// JSON error shape `{ "error": "..." }` returned by all error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}
