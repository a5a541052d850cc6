use axum::{
    Json,
    extract::{Path, State},
};

use trialdesk_api::{
    MatchingTrialsResponse, MutationResponse, SiteAnalytics, SitePendingInvitationsResponse,
    SiteTrialDocumentsResponse, SiteTrialsResponse, User,
};

use crate::AppState;
use crate::error::ApiErr;

/// GET /api/v1/sites/lookup/{number}: log in as the site with this number.
pub async fn lookup(
    State(state): State<AppState>,
    Path(number): Path<u32>,
) -> Result<Json<User>, ApiErr> {
    Ok(Json(state.api.login_site(number).await?))
}

/// GET /api/v1/sites/{site_id}/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SiteAnalytics>, ApiErr> {
    Ok(Json(state.api.get_site_analytics(&site_id).await?))
}

/// GET /api/v1/sites/{site_id}/trials
pub async fn trials(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SiteTrialsResponse>, ApiErr> {
    Ok(Json(state.api.get_site_trials(&site_id).await?))
}

/// GET /api/v1/sites/{site_id}/invitations: sponsor invitations awaiting the site.
pub async fn pending_invitations(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SitePendingInvitationsResponse>, ApiErr> {
    Ok(Json(state.api.get_site_pending_invitations(&site_id).await?))
}

/// GET /api/v1/sites/{site_id}/matching-trials
pub async fn matching_trials(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<MatchingTrialsResponse>, ApiErr> {
    Ok(Json(state.api.find_matching_trials(&site_id).await?))
}

/// GET /api/v1/sites/{site_id}/trials/{trial_id}/documents
pub async fn trial_documents(
    State(state): State<AppState>,
    Path((site_id, trial_id)): Path<(String, String)>,
) -> Result<Json<SiteTrialDocumentsResponse>, ApiErr> {
    Ok(Json(
        state
            .api
            .get_site_trial_documents(&site_id, &trial_id)
            .await?,
    ))
}

/// POST /api/v1/sites/{site_id}/invitations/{trial_id}/accept
pub async fn accept_invitation(
    State(state): State<AppState>,
    Path((site_id, trial_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, ApiErr> {
    Ok(Json(
        state
            .api
            .accept_trial_invitation(&site_id, &trial_id)
            .await?,
    ))
}

/// POST /api/v1/sites/{site_id}/invitations/{trial_id}/decline
pub async fn decline_invitation(
    State(state): State<AppState>,
    Path((site_id, trial_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, ApiErr> {
    Ok(Json(
        state
            .api
            .decline_trial_invitation(&site_id, &trial_id)
            .await?,
    ))
}
