use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Env {
    _dir: tempfile::TempDir,
    config: PathBuf,
}

fn setup(session: &str) -> Env {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("trialdesk.toml");
    let body = format!(
        "[api]\nlatency_ms = 0\n\n[query]\nretry_delay_ms = 0\n\n[storage]\ndir = {:?}\n\n{session}",
        dir.path().join("data").display().to_string()
    );
    std::fs::write(&config, body).expect("write config");
    Env { _dir: dir, config }
}

fn run(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trialdesk"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("TRIALDESK_CONFIG")
        .output()
        .expect("run trialdesk")
}

fn run_json(config: &Path, args: &[&str]) -> Value {
    let out = run(config, args);
    assert!(
        out.status.success(),
        "trialdesk {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("json stdout")
}

fn run_err(config: &Path, args: &[&str]) -> String {
    let out = run(config, args);
    assert!(!out.status.success(), "trialdesk {args:?} unexpectedly succeeded");
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn whoami_uses_the_configured_default() {
    let env = setup("");
    let user = run_json(&env.config, &["whoami"]);
    assert_eq!(user["kind"], "site");
    assert_eq!(user["id"], "site_0");
}

#[test]
fn last_login_is_remembered_until_logout() {
    let env = setup("[session]\nrole = \"site\"\nnumber = 3\n");

    let user = run_json(&env.config, &["--sponsor", "1", "whoami"]);
    assert_eq!(user["id"], "sponsor_1");
    let user = run_json(&env.config, &["whoami"]);
    assert_eq!(user["id"], "sponsor_1");

    let out = run_json(&env.config, &["logout"]);
    assert_eq!(out["logged_out"], true);
    let user = run_json(&env.config, &["whoami"]);
    assert_eq!(user["id"], "site_3");
}

#[test]
fn site_dashboard_bundles_three_views() {
    let env = setup("");
    let dash = run_json(&env.config, &["--site", "0", "dashboard"]);
    assert_eq!(dash["user"]["id"], "site_0");
    assert_eq!(dash["analytics"]["staff_statistics"]["total_staff"], 16);
    assert!(dash["trials"]["trials"].is_array());
    assert!(dash["pending_invitations"]["pending_invitations"].is_array());
}

#[test]
fn sponsor_dashboard_shows_details_and_requests() {
    let env = setup("");
    let dash = run_json(&env.config, &["--sponsor", "0", "dashboard"]);
    assert_eq!(dash["user"]["kind"], "sponsor");
    assert!(dash["details"].is_object());
    assert!(dash["pending_invitations"]["pending_invitations"].is_array());
}

#[test]
fn site_can_accept_a_pending_invitation() {
    let env = setup("");
    let resp = run_json(&env.config, &["--site", "0", "accept", "trial_1"]);
    assert_eq!(resp["result"]["success"], true);

    let pending = resp["pending_invitations"]["pending_invitations"]
        .as_array()
        .expect("pending list");
    assert!(pending.iter().all(|i| i["trial_id"] != "trial_1"));
    assert_eq!(
        resp["pending_invitations"]["total_count"],
        resp["pending_before"].as_u64().expect("count") - 1
    );
}

#[test]
fn sponsor_declining_a_request_refreshes_its_list() {
    let env = setup("");
    let resp = run_json(
        &env.config,
        &["--sponsor", "0", "decline", "trial_0", "site_6"],
    );
    assert_eq!(resp["result"]["success"], true);
    let pending = resp["pending_invitations"]["pending_invitations"]
        .as_array()
        .expect("pending list");
    assert!(pending.iter().all(|i| i["site_id"] != "site_6"));
}

#[test]
fn role_specific_commands_are_rejected_for_the_other_role() {
    let env = setup("");
    let err = run_err(&env.config, &["--sponsor", "0", "documents", "trial_0"]);
    assert!(err.contains("only available to sites"), "{err}");

    let err = run_err(&env.config, &["--sponsor", "0", "accept", "trial_0"]);
    assert!(err.contains("requesting site"), "{err}");
}

#[test]
fn unknown_account_fails_the_login() {
    let env = setup("");
    let err = run_err(&env.config, &["--site", "42", "whoami"]);
    assert!(err.contains("site number not found: 42"), "{err}");
}

#[test]
fn config_prints_effective_settings() {
    let env = setup("");
    let out = run(&env.config, &["config"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("latency_ms = 0"), "{text}");
    assert!(text.contains("max_retries = 1"), "{text}");
}
