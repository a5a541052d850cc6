use std::sync::Arc;
use std::time::Duration;

use trialdesk_api::{Role, ServiceError};
use trialdesk_api_client::{HttpApi, LatencySimulator, MockApi, TrialApi};
use trialdesk_mock_db::MockDb;
use trialdesk_server::{AppState, router};

async fn spawn_server() -> HttpApi {
    let api = MockApi::new(Arc::new(MockDb::seeded().unwrap()), LatencySimulator::none());
    let app = router(AppState::new(Arc::new(api)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpApi::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let client = spawn_server().await;
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn logins_resolve_over_http() {
    let client = spawn_server().await;

    let site = client.login_site(2).await.unwrap();
    assert_eq!(site.role(), Role::Site);
    assert_eq!(site.id(), "site_2");

    let sponsor = client.login_sponsor(1).await.unwrap();
    assert_eq!(sponsor.role(), Role::Sponsor);
    assert_eq!(sponsor.id(), "sponsor_1");

    let err = client.login_site(42).await.unwrap_err();
    assert_eq!(err, ServiceError::NotFound("site number not found: 42".into()));
}

#[tokio::test]
async fn views_match_the_in_process_facade() {
    let client = spawn_server().await;
    let local = MockApi::new(Arc::new(MockDb::seeded().unwrap()), LatencySimulator::none());

    let analytics = client.get_site_analytics("site_0").await.unwrap();
    assert_eq!(analytics.staff_statistics.total_staff, 16);
    assert_eq!(analytics, local.get_site_analytics("site_0").await.unwrap());

    assert_eq!(
        client.get_sponsor_details("sponsor_0").await.unwrap(),
        local.get_sponsor_details("sponsor_0").await.unwrap()
    );

    let bundle = client.get_trial_with_sites("trial_0").await.unwrap();
    assert_eq!(bundle.trial.id, "trial_0");
    assert_eq!(bundle.sites, client.get_trial_sites("trial_0").await.unwrap().sites);
}

#[tokio::test]
async fn missing_records_come_back_as_not_found() {
    let client = spawn_server().await;

    let err = client.get_trial_details("trial_x").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message(), "trial not found: trial_x");

    let err = client
        .get_site_trial_documents("site_0", "trial_1")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn accepting_an_invitation_is_visible_to_later_reads() {
    let client = spawn_server().await;

    let before = client.get_site_pending_invitations("site_0").await.unwrap();
    assert!(before.pending_invitations.iter().any(|i| i.trial_id == "trial_1"));

    let resp = client.accept_trial_invitation("site_0", "trial_1").await.unwrap();
    assert!(resp.success);

    let after = client.get_site_pending_invitations("site_0").await.unwrap();
    assert_eq!(after.total_count, before.total_count - 1);
    let sites = client.get_trial_sites("trial_1").await.unwrap();
    assert!(sites.sites.iter().any(|s| s.site_id == "site_0"));

    let again = client.decline_trial_invitation("site_0", "trial_1").await.unwrap();
    assert!(again.success);
}
