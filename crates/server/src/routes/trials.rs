use axum::{
    Json,
    extract::{Path, State},
};

use trialdesk_api::{
    MatchingSitesResponse, MutationResponse, Trial, TrialSitesResponse, TrialWithSitesResponse,
};

use crate::AppState;
use crate::error::ApiErr;

/// GET /api/v1/trials/{trial_id}
pub async fn details(
    State(state): State<AppState>,
    Path(trial_id): Path<String>,
) -> Result<Json<Trial>, ApiErr> {
    Ok(Json(state.api.get_trial_details(&trial_id).await?))
}

/// GET /api/v1/trials/{trial_id}/sites
pub async fn sites(
    State(state): State<AppState>,
    Path(trial_id): Path<String>,
) -> Result<Json<TrialSitesResponse>, ApiErr> {
    Ok(Json(state.api.get_trial_sites(&trial_id).await?))
}

/// GET /api/v1/trials/{trial_id}/with-sites
pub async fn with_sites(
    State(state): State<AppState>,
    Path(trial_id): Path<String>,
) -> Result<Json<TrialWithSitesResponse>, ApiErr> {
    Ok(Json(state.api.get_trial_with_sites(&trial_id).await?))
}

/// GET /api/v1/trials/{trial_id}/matching-sites
pub async fn matching_sites(
    State(state): State<AppState>,
    Path(trial_id): Path<String>,
) -> Result<Json<MatchingSitesResponse>, ApiErr> {
    Ok(Json(state.api.find_matching_sites(&trial_id).await?))
}

/// POST /api/v1/trials/{trial_id}/invitations/{site_id}/accept: admit a requesting site.
pub async fn accept_invitation(
    State(state): State<AppState>,
    Path((trial_id, site_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, ApiErr> {
    Ok(Json(
        state
            .api
            .accept_site_invitation(&trial_id, &site_id)
            .await?,
    ))
}

/// POST /api/v1/trials/{trial_id}/invitations/{site_id}/decline
pub async fn decline_invitation(
    State(state): State<AppState>,
    Path((trial_id, site_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, ApiErr> {
    Ok(Json(
        state
            .api
            .decline_site_invitation(&trial_id, &site_id)
            .await?,
    ))
}
