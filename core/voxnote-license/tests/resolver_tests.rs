mod common;

use chrono::{Duration, Utc};
use common::{base_payload, seal, TestEnv};
use serde_json::json;
use voxnote_license::{
    app_state_at, generate_machine_id, resolve, AppState, LicenseRecord, TechnicalStatus,
};

fn record_expiring_at(expires_at: &str) -> LicenseRecord {
    LicenseRecord {
        license_version: 1,
        machine_id: "ABC".to_string(),
        issued_at: "2026-01-01T00:00:00+00:00".to_string(),
        not_before: "2026-01-01T00:00:00+00:00".to_string(),
        expires_at: expires_at.to_string(),
        features: [("transcription".to_string(), json!(true))]
            .into_iter()
            .collect(),
        license_hash: String::new(),
        signature: String::new(),
    }
}

// ── Valid path ───────────────────────────────────────────────────

#[test]
fn healthy_license_is_active() {
    let env = TestEnv::new();
    let now = Utc::now();
    env.write_valid_license(now, Duration::days(30) + Duration::hours(1));

    let state = app_state_at(&env.paths, now);
    assert_eq!(state.state, AppState::Active);
    assert!(state.allow_usage);
    assert!(!state.show_warning);
    assert_eq!(state.user_message, "Application ready");
    assert_eq!(state.days_remaining, Some(30));
    assert_eq!(state.technical_status, TechnicalStatus::Valid);

    let features = state.features.expect("features populated when valid");
    assert_eq!(features.get("transcription"), Some(&json!(true)));
}

#[test]
fn four_days_left_is_still_active() {
    let env = TestEnv::new();
    let now = Utc::now();
    env.write_valid_license(now, Duration::days(4) + Duration::hours(1));

    let state = app_state_at(&env.paths, now);
    assert_eq!(state.state, AppState::Active);
    assert_eq!(state.days_remaining, Some(4));
    assert!(!state.show_warning);
}

#[test]
fn three_days_left_is_expiring_soon() {
    let env = TestEnv::new();
    let now = Utc::now();
    env.write_valid_license(now, Duration::days(3) + Duration::hours(1));

    let state = app_state_at(&env.paths, now);
    assert_eq!(state.state, AppState::ExpiringSoon);
    assert!(state.allow_usage);
    assert!(state.show_warning);
    assert_eq!(state.days_remaining, Some(3));
    assert!(state.user_message.contains("in 3 days"));
}

#[test]
fn one_day_left_says_tomorrow() {
    let env = TestEnv::new();
    let now = Utc::now();
    env.write_valid_license(now, Duration::days(1) + Duration::hours(1));

    let state = app_state_at(&env.paths, now);
    assert_eq!(state.state, AppState::ExpiringSoon);
    assert_eq!(state.days_remaining, Some(1));
    assert!(state.user_message.contains("tomorrow"));
}

#[test]
fn expiring_today_says_today() {
    let env = TestEnv::new();
    let now = Utc::now();
    env.write_valid_license(now, Duration::hours(12));

    let state = app_state_at(&env.paths, now);
    assert_eq!(state.state, AppState::ExpiringSoon);
    assert_eq!(state.days_remaining, Some(0));
    assert!(state.user_message.contains("today"));
}

// ── Expired and blocked paths ────────────────────────────────────

#[test]
fn expired_license_is_expired_state() {
    let env = TestEnv::new();
    let now = Utc::now();
    let payload = base_payload(
        &generate_machine_id(),
        now - Duration::days(60),
        now - Duration::days(60),
        now - Duration::days(2),
    );
    env.write_license(&seal(payload, &env.signing_key));

    let state = app_state_at(&env.paths, now);
    assert_eq!(state.state, AppState::Expired);
    assert!(!state.allow_usage);
    assert!(!state.show_warning);
    assert!(state.user_message.contains("expired"));
    assert_eq!(state.days_remaining, None);
    assert_eq!(state.features, None);
    assert_eq!(state.technical_status, TechnicalStatus::Expired);
}

#[test]
fn tampered_license_is_blocked() {
    let env = TestEnv::new();
    let now = Utc::now();
    let mut doc = env.write_valid_license(now, Duration::days(30));
    doc.insert("features".to_string(), json!({"everything": true}));
    env.write_license(&doc);

    let state = app_state_at(&env.paths, now);
    assert_eq!(state.state, AppState::Blocked);
    assert!(!state.allow_usage);
    assert_eq!(state.features, None);
    assert_eq!(state.technical_status, TechnicalStatus::Manipulated);
}

#[test]
fn all_hostile_statuses_share_one_message() {
    let now = Utc::now();
    let hostile = [
        TechnicalStatus::Invalid,
        TechnicalStatus::Manipulated,
        TechnicalStatus::ClockRollback,
    ];
    let messages: Vec<String> = hostile
        .iter()
        .map(|s| resolve(*s, None, now).user_message)
        .collect();

    assert_eq!(messages[0], messages[1]);
    assert_eq!(messages[1], messages[2]);
    // The message must not name the failing defense.
    for message in &messages {
        let lower = message.to_lowercase();
        assert!(!lower.contains("signature"));
        assert!(!lower.contains("hash"));
        assert!(!lower.contains("clock"));
        assert!(!lower.contains("machine"));
    }
}

#[test]
fn valid_but_unreadable_record_is_blocked() {
    let now = Utc::now();
    let state = resolve(TechnicalStatus::Valid, None, now);
    assert_eq!(state.state, AppState::Blocked);
    assert!(!state.allow_usage);
}

#[test]
fn valid_with_unparsable_expiry_is_blocked() {
    let now = Utc::now();
    let record = record_expiring_at("someday");
    let state = resolve(TechnicalStatus::Valid, Some(&record), now);
    assert_eq!(state.state, AppState::Blocked);
}

// ── Purity and boundaries of the pure resolver ───────────────────

#[test]
fn resolve_is_pure() {
    let now = Utc::now();
    let record = record_expiring_at(&(now + Duration::days(10)).to_rfc3339());
    let a = resolve(TechnicalStatus::Valid, Some(&record), now);
    let b = resolve(TechnicalStatus::Valid, Some(&record), now);
    assert_eq!(a, b);
}

#[test]
fn boundary_days_exactness() {
    let now = Utc::now();

    let record = record_expiring_at(&(now + Duration::days(3) + Duration::hours(2)).to_rfc3339());
    let state = resolve(TechnicalStatus::Valid, Some(&record), now);
    assert_eq!(state.days_remaining, Some(3));
    assert_eq!(state.state, AppState::ExpiringSoon);

    let record = record_expiring_at(&(now + Duration::days(4) + Duration::hours(2)).to_rfc3339());
    let state = resolve(TechnicalStatus::Valid, Some(&record), now);
    assert_eq!(state.days_remaining, Some(4));
    assert_eq!(state.state, AppState::Active);
}

#[test]
fn should_block_follows_allow_usage() {
    let now = Utc::now();
    let blocked = resolve(TechnicalStatus::Manipulated, None, now);
    assert!(blocked.should_block());

    let record = record_expiring_at(&(now + Duration::days(10)).to_rfc3339());
    let active = resolve(TechnicalStatus::Valid, Some(&record), now);
    assert!(!active.should_block());
}

#[test]
fn app_state_serializes_for_the_http_layer() {
    let now = Utc::now();
    let record = record_expiring_at(&(now + Duration::days(10)).to_rfc3339());
    let state = resolve(TechnicalStatus::Valid, Some(&record), now);

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["state"], "ACTIVE");
    assert_eq!(json["technical_status"], "valid");
    assert_eq!(json["allow_usage"], true);
}
