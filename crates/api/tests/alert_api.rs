//! HTTP-level integration tests for the security alert detector and
//! the alert management endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, get_auth, post_json_api_key, post_json_auth, seed_service, seed_session, seed_user,
};
use sqlx::PgPool;

use shadowid_core::activity::{event_types, statuses, trace_hash};
use shadowid_db::models::CreateActivity;
use shadowid_db::repositories::{ActivityRepo, ShadowTokenRepo};

const RIYADH: &str = "24.7136,46.6753";
const JEDDAH: &str = "21.5433,39.1728";

/// Seed a user with a live session and issue a token through the API.
async fn issue_token(
    app: axum::Router,
    pool: &PgPool,
    national_id: &str,
    fingerprint: &str,
    location: &str,
) -> (String, String) {
    let user = seed_user(pool, national_id).await;
    let (_session, jwt) = seed_session(pool, user.id, fingerprint).await;
    let body = serde_json::json!({ "location": location });
    let response = post_json_auth(app, "/api/v1/tokens", &jwt, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();
    (token, jwt)
}

async fn run_detect(app: axum::Router, jwt: &str) -> serde_json::Value {
    let response =
        post_json_auth(app, "/api/v1/alerts/detect", jwt, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Detection passes
// ---------------------------------------------------------------------------

/// Two identities on one device raise a medium multi-identity alert,
/// and a repeated sweep does not raise it twice.
#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_flags_shared_device(pool: PgPool) {
    let first = seed_user(&pool, "4000000001").await;
    let (_s1, jwt) = seed_session(&pool, first.id, "fp-shared").await;
    let second = seed_user(&pool, "4000000002").await;
    let (_s2, _jwt2) = seed_session(&pool, second.id, "fp-shared").await;
    let app = common::build_test_app(pool);

    let summary = run_detect(app.clone(), &jwt).await;
    assert_eq!(summary["data"]["multipleIdentities"], 1);

    let json = body_json(
        get_auth(app.clone(), "/api/v1/alerts?alertType=multiple_identities", &jwt).await,
    )
    .await;
    let alerts = json["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["severity"], "medium");
    assert_eq!(alerts[0]["metadata"]["fingerprint"], "fp-shared");

    // Dedup: the unresolved alert suppresses a second copy.
    let summary = run_detect(app, &jwt).await;
    assert_eq!(summary["data"]["multipleIdentities"], 0);
}

/// Revoked sessions stop feeding the multi-identity pass immediately.
#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_ignores_revoked_sessions(pool: PgPool) {
    let first = seed_user(&pool, "4000000011").await;
    let (_s1, jwt) = seed_session(&pool, first.id, "fp-stale").await;
    let second = seed_user(&pool, "4000000012").await;
    let (s2, _jwt2) = seed_session(&pool, second.id, "fp-stale").await;

    sqlx::query("UPDATE sessions SET is_active = false WHERE session_id = $1")
        .bind(&s2.session_id)
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let summary = run_detect(app, &jwt).await;
    assert_eq!(
        summary["data"]["multipleIdentities"], 0,
        "one live identity per device is not sharing"
    );
}

/// Three identities on one device escalate to high severity.
#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_escalates_with_identity_count(pool: PgPool) {
    let mut jwt = String::new();
    for national_id in ["4000000003", "4000000004", "4000000005"] {
        let user = seed_user(&pool, national_id).await;
        let (_s, token) = seed_session(&pool, user.id, "fp-crowded").await;
        jwt = token;
    }
    let app = common::build_test_app(pool);

    run_detect(app.clone(), &jwt).await;
    let json =
        body_json(get_auth(app, "/api/v1/alerts?alertType=multiple_identities", &jwt).await).await;
    assert_eq!(json["data"][0]["severity"], "high");
}

/// Redemptions 850 km apart within the hour raise a critical
/// impossible-travel alert.
#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_flags_impossible_travel(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, jwt) = issue_token(app.clone(), &pool, "4000000006", "fp-travel", RIYADH).await;
    let stored = ShadowTokenRepo::find_by_token(&pool, &token)
        .await
        .unwrap()
        .unwrap();

    for location in [RIYADH, JEDDAH] {
        ActivityRepo::create(
            &pool,
            &CreateActivity {
                token_id: Some(stored.id),
                event_type: event_types::USED.into(),
                service: "Checkpoint".into(),
                location: location.into(),
                region: None,
                status: statuses::VERIFIED.into(),
                trace_hash: trace_hash(),
                metadata: None,
            },
        )
        .await
        .unwrap();
    }

    let summary = run_detect(app.clone(), &jwt).await;
    assert_eq!(summary["data"]["impossibleTravel"], 1);

    let json =
        body_json(get_auth(app.clone(), "/api/v1/alerts?alertType=impossible_travel", &jwt).await)
            .await;
    let alert = &json["data"][0];
    assert_eq!(alert["severity"], "critical");
    assert_eq!(alert["userId"], stored.user_id);

    // Per-user dedup holds across sweeps.
    let summary = run_detect(app, &jwt).await;
    assert_eq!(summary["data"]["impossibleTravel"], 0);
}

/// A high-risk scan feeds both the device-hopping and high-risk passes.
#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_flags_high_risk_scan(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Sweep", false).await;
    let app = common::build_test_app(pool.clone());
    let (token, jwt) = issue_token(app.clone(), &pool, "4000000007", "fp-home", RIYADH).await;

    // Different device, different city: scores 80 and persists High.
    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-away",
        "location": JEDDAH,
    });
    let json = body_json(post_json_api_key(app.clone(), "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], false);

    // The token-scoped passes have no freshness cutoff: an old token
    // with a persisted High score is still picked up.
    sqlx::query("UPDATE shadow_tokens SET created_at = created_at - INTERVAL '2 hours'")
        .execute(&pool)
        .await
        .unwrap();

    let summary = run_detect(app.clone(), &jwt).await;
    assert_eq!(summary["data"]["deviceHopping"], 1);
    assert_eq!(summary["data"]["highRiskScans"], 1);

    let json =
        body_json(get_auth(app.clone(), "/api/v1/alerts?alertType=high_risk_scan", &jwt).await)
            .await;
    assert_eq!(json["data"][0]["severity"], "high");
    assert_eq!(json["data"][0]["metadata"]["riskScore"], 80);

    // Both passes dedup per token.
    let summary = run_detect(app.clone(), &jwt).await;
    assert_eq!(summary["data"]["deviceHopping"], 0);
    assert_eq!(summary["data"]["highRiskScans"], 0);

    // Resolving the alerts does not resurrect them: the evidence is the
    // same immutable token.
    let json =
        body_json(get_auth(app.clone(), "/api/v1/alerts?includeResolved=true", &jwt).await).await;
    for alert in json["data"].as_array().unwrap() {
        let id = alert["id"].as_i64().unwrap();
        let uri = format!("/api/v1/alerts/{id}/resolve");
        let response = post_json_auth(app.clone(), &uri, &jwt, serde_json::json!({})).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let summary = run_detect(app, &jwt).await;
    assert_eq!(summary["data"]["deviceHopping"], 0);
    assert_eq!(summary["data"]["highRiskScans"], 0);
}

/// A clean deployment has nothing to report.
#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_is_quiet_without_anomalies(pool: PgPool) {
    let user = seed_user(&pool, "4000000008").await;
    let (_s, jwt) = seed_session(&pool, user.id, "fp-quiet").await;
    let app = common::build_test_app(pool);

    let summary = run_detect(app, &jwt).await;
    assert_eq!(summary["data"]["multipleIdentities"], 0);
    assert_eq!(summary["data"]["impossibleTravel"], 0);
    assert_eq!(summary["data"]["deviceHopping"], 0);
    assert_eq!(summary["data"]["highRiskScans"], 0);
}

// ---------------------------------------------------------------------------
// Alert management
// ---------------------------------------------------------------------------

/// Resolution flips the flag, drops the alert from the default listing,
/// and cannot be repeated.
#[sqlx::test(migrations = "../db/migrations")]
async fn resolve_is_single_shot(pool: PgPool) {
    let first = seed_user(&pool, "4000000009").await;
    let (_s1, jwt) = seed_session(&pool, first.id, "fp-resolve").await;
    let second = seed_user(&pool, "4000000010").await;
    let (_s2, _jwt2) = seed_session(&pool, second.id, "fp-resolve").await;
    let app = common::build_test_app(pool);

    run_detect(app.clone(), &jwt).await;
    let json = body_json(get_auth(app.clone(), "/api/v1/alerts", &jwt).await).await;
    let id = json["data"][0]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/alerts/{id}/resolve");
    let response = post_json_auth(app.clone(), &uri, &jwt, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["isResolved"], true);

    // Gone from the default listing, still visible when asked for.
    let json = body_json(get_auth(app.clone(), "/api/v1/alerts", &jwt).await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
    let json =
        body_json(get_auth(app.clone(), "/api/v1/alerts?includeResolved=true", &jwt).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = post_json_auth(app.clone(), &uri, &jwt, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response =
        post_json_auth(app, "/api/v1/alerts/999999/resolve", &jwt, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
