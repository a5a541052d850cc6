use axum::{
    Json,
    extract::{Path, State},
};

use trialdesk_api::{SponsorDetailsResponse, SponsorPendingInvitationsResponse, User};

use crate::AppState;
use crate::error::ApiErr;

/// GET /api/v1/sponsors/lookup/{number}: log in as the sponsor with this number.
pub async fn lookup(
    State(state): State<AppState>,
    Path(number): Path<u32>,
) -> Result<Json<User>, ApiErr> {
    Ok(Json(state.api.login_sponsor(number).await?))
}

/// GET /api/v1/sponsors/{sponsor_id}: sponsor record plus its trials.
pub async fn details(
    State(state): State<AppState>,
    Path(sponsor_id): Path<String>,
) -> Result<Json<SponsorDetailsResponse>, ApiErr> {
    Ok(Json(state.api.get_sponsor_details(&sponsor_id).await?))
}

/// GET /api/v1/sponsors/{sponsor_id}/invitations: site requests awaiting the sponsor.
pub async fn pending_invitations(
    State(state): State<AppState>,
    Path(sponsor_id): Path<String>,
) -> Result<Json<SponsorPendingInvitationsResponse>, ApiErr> {
    Ok(Json(
        state
            .api
            .get_sponsor_pending_invitations(&sponsor_id)
            .await?,
    ))
}
