//! Axum front for the TrialDesk facade.
//!
//! Every route forwards to a [`TrialApi`]; the binary plugs in the mock
//! backend, tests can plug in anything else.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use trialdesk_api::paths;
use trialdesk_api_client::TrialApi;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn TrialApi>,
}

impl AppState {
    pub fn new(api: Arc<dyn TrialApi>) -> Self {
        Self { api }
    }
}

/// Full application router, with everything mounted under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(paths::HEALTH_ROUTE, get(routes::health::health))
        // Sites
        .route(paths::SITE_LOOKUP_ROUTE, get(routes::sites::lookup))
        .route(paths::SITE_ANALYTICS_ROUTE, get(routes::sites::analytics))
        .route(paths::SITE_TRIALS_ROUTE, get(routes::sites::trials))
        .route(
            paths::SITE_INVITATIONS_ROUTE,
            get(routes::sites::pending_invitations),
        )
        .route(
            paths::SITE_MATCHING_TRIALS_ROUTE,
            get(routes::sites::matching_trials),
        )
        .route(
            paths::SITE_TRIAL_DOCUMENTS_ROUTE,
            get(routes::sites::trial_documents),
        )
        .route(
            paths::SITE_ACCEPT_INVITATION_ROUTE,
            post(routes::sites::accept_invitation),
        )
        .route(
            paths::SITE_DECLINE_INVITATION_ROUTE,
            post(routes::sites::decline_invitation),
        )
        // Sponsors
        .route(paths::SPONSOR_LOOKUP_ROUTE, get(routes::sponsors::lookup))
        .route(paths::SPONSOR_ROUTE, get(routes::sponsors::details))
        .route(
            paths::SPONSOR_INVITATIONS_ROUTE,
            get(routes::sponsors::pending_invitations),
        )
        // Trials
        .route(paths::TRIAL_ROUTE, get(routes::trials::details))
        .route(paths::TRIAL_SITES_ROUTE, get(routes::trials::sites))
        .route(paths::TRIAL_WITH_SITES_ROUTE, get(routes::trials::with_sites))
        .route(
            paths::TRIAL_MATCHING_SITES_ROUTE,
            get(routes::trials::matching_sites),
        )
        .route(
            paths::TRIAL_ACCEPT_INVITATION_ROUTE,
            post(routes::trials::accept_invitation),
        )
        .route(
            paths::TRIAL_DECLINE_INVITATION_ROUTE,
            post(routes::trials::decline_invitation),
        );

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
