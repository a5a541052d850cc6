//! REST paths for every facade operation, relative to the `/api` prefix.
//!
//! The `*_ROUTE` constants are the Axum route patterns; the functions build
//! concrete request paths for the HTTP client. Both live here so server and
//! client cannot drift apart.

pub const HEALTH_ROUTE: &str = "/health";
pub const SITE_LOOKUP_ROUTE: &str = "/v1/sites/lookup/{number}";
pub const SPONSOR_LOOKUP_ROUTE: &str = "/v1/sponsors/lookup/{number}";
pub const SITE_ANALYTICS_ROUTE: &str = "/v1/sites/{site_id}/analytics";
pub const SITE_TRIALS_ROUTE: &str = "/v1/sites/{site_id}/trials";
pub const SITE_INVITATIONS_ROUTE: &str = "/v1/sites/{site_id}/invitations";
pub const SITE_MATCHING_TRIALS_ROUTE: &str = "/v1/sites/{site_id}/matching-trials";
pub const SITE_TRIAL_DOCUMENTS_ROUTE: &str = "/v1/sites/{site_id}/trials/{trial_id}/documents";
pub const SITE_ACCEPT_INVITATION_ROUTE: &str = "/v1/sites/{site_id}/invitations/{trial_id}/accept";
pub const SITE_DECLINE_INVITATION_ROUTE: &str =
    "/v1/sites/{site_id}/invitations/{trial_id}/decline";
pub const SPONSOR_ROUTE: &str = "/v1/sponsors/{sponsor_id}";
pub const SPONSOR_INVITATIONS_ROUTE: &str = "/v1/sponsors/{sponsor_id}/invitations";
pub const TRIAL_ROUTE: &str = "/v1/trials/{trial_id}";
pub const TRIAL_SITES_ROUTE: &str = "/v1/trials/{trial_id}/sites";
pub const TRIAL_WITH_SITES_ROUTE: &str = "/v1/trials/{trial_id}/with-sites";
pub const TRIAL_MATCHING_SITES_ROUTE: &str = "/v1/trials/{trial_id}/matching-sites";
pub const TRIAL_ACCEPT_INVITATION_ROUTE: &str = "/v1/trials/{trial_id}/invitations/{site_id}/accept";
pub const TRIAL_DECLINE_INVITATION_ROUTE: &str =
    "/v1/trials/{trial_id}/invitations/{site_id}/decline";

pub fn site_lookup(number: u32) -> String {
    format!("/v1/sites/lookup/{number}")
}

pub fn sponsor_lookup(number: u32) -> String {
    format!("/v1/sponsors/lookup/{number}")
}

pub fn site_analytics(site_id: &str) -> String {
    format!("/v1/sites/{}/analytics", segment(site_id))
}

pub fn site_trials(site_id: &str) -> String {
    format!("/v1/sites/{}/trials", segment(site_id))
}

pub fn site_invitations(site_id: &str) -> String {
    format!("/v1/sites/{}/invitations", segment(site_id))
}

pub fn site_matching_trials(site_id: &str) -> String {
    format!("/v1/sites/{}/matching-trials", segment(site_id))
}

pub fn site_trial_documents(site_id: &str, trial_id: &str) -> String {
    format!(
        "/v1/sites/{}/trials/{}/documents",
        segment(site_id),
        segment(trial_id)
    )
}

pub fn site_invitation_action(site_id: &str, trial_id: &str, action: InvitationAction) -> String {
    format!(
        "/v1/sites/{}/invitations/{}/{}",
        segment(site_id),
        segment(trial_id),
        action.as_str()
    )
}

pub fn sponsor(sponsor_id: &str) -> String {
    format!("/v1/sponsors/{}", segment(sponsor_id))
}

pub fn sponsor_invitations(sponsor_id: &str) -> String {
    format!("/v1/sponsors/{}/invitations", segment(sponsor_id))
}

pub fn trial(trial_id: &str) -> String {
    format!("/v1/trials/{}", segment(trial_id))
}

pub fn trial_sites(trial_id: &str) -> String {
    format!("/v1/trials/{}/sites", segment(trial_id))
}

pub fn trial_with_sites(trial_id: &str) -> String {
    format!("/v1/trials/{}/with-sites", segment(trial_id))
}

pub fn trial_matching_sites(trial_id: &str) -> String {
    format!("/v1/trials/{}/matching-sites", segment(trial_id))
}

pub fn trial_invitation_action(trial_id: &str, site_id: &str, action: InvitationAction) -> String {
    format!(
        "/v1/trials/{}/invitations/{}/{}",
        segment(trial_id),
        segment(site_id),
        action.as_str()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationAction {
    Accept,
    Decline,
}

impl InvitationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
        }
    }
}

/// Identifiers are opaque; keep them from escaping their path segment.
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}
