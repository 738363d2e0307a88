//! HTTP-level integration tests for token redemption.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, post_json_api_key, post_json_auth, seed_service, seed_session, seed_user,
};
use sqlx::PgPool;

use shadowid_db::repositories::ShadowTokenRepo;

const RIYADH: &str = "24.7136,46.6753";
const JEDDAH: &str = "21.5433,39.1728";

/// Issue a token for a freshly seeded user and return its string value.
async fn issue_token(
    app: axum::Router,
    pool: &PgPool,
    national_id: &str,
    fingerprint: &str,
    location: &str,
) -> String {
    let user = seed_user(pool, national_id).await;
    let (_session, jwt) = seed_session(pool, user.id, fingerprint).await;
    let body = serde_json::json!({ "location": location });
    let response = post_json_auth(app, "/api/v1/tokens", &jwt, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn scan_requires_api_key(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "token": "SID-ABCDEFGH-ABCDEFGH" });
    let response = common::post_json(app, "/api/v1/scan", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn scan_rejects_unknown_api_key(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "token": "SID-ABCDEFGH-ABCDEFGH" });
    let response = post_json_api_key(app, "/api/v1/scan", "not-a-key", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Redemption flow
// ---------------------------------------------------------------------------

/// A clean same-device same-place scan verifies and consumes the token.
#[sqlx::test(migrations = "../db/migrations")]
async fn clean_scan_verifies_and_consumes(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Alpha", false).await;
    let app = common::build_test_app(pool.clone());
    let token = issue_token(app.clone(), &pool, "2000000001", "fp-clean", RIYADH).await;

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-clean",
        "location": RIYADH,
    });
    let response = post_json_api_key(app.clone(), "/api/v1/scan", &api_key, body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["verified"], true);
    assert_eq!(json["data"]["riskLevel"], "Low");
    assert!(json["data"].get("identity").is_none());

    let stored = ShadowTokenRepo::find_by_token(&pool, &token)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_used);
    assert!(!stored.is_active);

    // A replay is rejected and flagged as reuse, but the score persisted
    // at redemption stays untouched.
    let response = post_json_api_key(app, "/api/v1/scan", &api_key, body).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["verified"], false);
    assert_eq!(json["data"]["message"], "Token has already been used");
    assert!(json["data"]["anomalies"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("token_reuse")));

    let stored = ShadowTokenRepo::find_by_token(&pool, &token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.risk_score, 0, "replay must not rewrite the redemption score");
    assert_eq!(stored.risk_level, "Low");
}

/// Junk input and unknown tokens reject without touching state.
#[sqlx::test(migrations = "../db/migrations")]
async fn malformed_and_unknown_tokens_reject(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Beta", false).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "token": "definitely-not-a-token" });
    let json = body_json(post_json_api_key(app.clone(), "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], false);
    assert_eq!(json["data"]["message"], "Invalid token format");

    let body = serde_json::json!({ "token": "SID-AAAAAAAA-AAAAAAAA" });
    let json = body_json(post_json_api_key(app, "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], false);
    assert_eq!(json["data"]["message"], "Token not found");
}

/// An expired token rejects and is retired on the spot.
#[sqlx::test(migrations = "../db/migrations")]
async fn expired_token_rejects(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Gamma", false).await;
    let app = common::build_test_app(pool.clone());
    let token = issue_token(app.clone(), &pool, "2000000002", "fp-exp", RIYADH).await;

    sqlx::query("UPDATE shadow_tokens SET expires_at = NOW() - INTERVAL '1 second'")
        .execute(&pool)
        .await
        .unwrap();

    let body = serde_json::json!({ "token": token, "deviceFingerprint": "fp-exp" });
    let json = body_json(post_json_api_key(app, "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], false);
    assert_eq!(json["data"]["message"], "Token has expired");

    let stored = ShadowTokenRepo::find_by_token(&pool, &token)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active);
    assert!(!stored.is_used, "an expired token is never consumed");
}

/// Device hop plus impossible travel pushes the score to High; the scan
/// rejects and the token survives for investigation.
#[sqlx::test(migrations = "../db/migrations")]
async fn high_risk_scan_rejects_without_consuming(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Delta", false).await;
    let app = common::build_test_app(pool.clone());
    let token = issue_token(app.clone(), &pool, "2000000003", "fp-origin", RIYADH).await;

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-stolen",
        "location": JEDDAH,
    });
    let response = post_json_api_key(app, "/api/v1/scan", &api_key, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["verified"], false);
    assert_eq!(json["data"]["message"], "Scan rejected due to high risk");
    assert_eq!(json["data"]["riskLevel"], "High");
    assert_eq!(json["data"]["riskScore"], 80);
    let anomalies = json["data"]["anomalies"].as_array().unwrap();
    assert!(anomalies.contains(&serde_json::json!("device_hopping")), "got {anomalies:?}");
    assert!(anomalies.contains(&serde_json::json!("impossible_travel")), "got {anomalies:?}");

    let stored = ShadowTokenRepo::find_by_token(&pool, &token)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_used, "high-risk rejection must not consume");
    assert_eq!(stored.risk_level, "High");
    assert_eq!(stored.risk_score, 80);
}

/// A high-risk rejection leaves the token redeemable: a later scan from
/// the issuing device at the issuing location goes through.
#[sqlx::test(migrations = "../db/migrations")]
async fn lower_risk_rescan_succeeds_after_high_risk_rejection(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Epsilon", false).await;
    let app = common::build_test_app(pool.clone());
    let token = issue_token(app.clone(), &pool, "2000000005", "fp-origin", RIYADH).await;

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-stolen",
        "location": JEDDAH,
    });
    let json = body_json(post_json_api_key(app.clone(), "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], false);
    assert_eq!(json["data"]["riskLevel"], "High");

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-origin",
        "location": RIYADH,
    });
    let json = body_json(post_json_api_key(app, "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], true, "got {json}");
    assert_eq!(json["data"]["riskLevel"], "Low");

    let stored = ShadowTokenRepo::find_by_token(&pool, &token)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_used);
}

/// A token that was redeemed and then lapsed answers with expiry, not
/// reuse.
#[sqlx::test(migrations = "../db/migrations")]
async fn used_then_expired_token_reports_expiry(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Zeta", false).await;
    let app = common::build_test_app(pool.clone());
    let token = issue_token(app.clone(), &pool, "2000000006", "fp-lapsed", RIYADH).await;

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-lapsed",
        "location": RIYADH,
    });
    let json = body_json(post_json_api_key(app.clone(), "/api/v1/scan", &api_key, body.clone()).await)
        .await;
    assert_eq!(json["data"]["verified"], true);

    sqlx::query("UPDATE shadow_tokens SET expires_at = NOW() - INTERVAL '1 second'")
        .execute(&pool)
        .await
        .unwrap();

    let json = body_json(post_json_api_key(app, "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], false);
    assert_eq!(json["data"]["message"], "Token has expired");
}

/// The generation-burst rule is anchored at issuance: scanning well
/// after the burst window has passed still flags the token.
#[sqlx::test(migrations = "../db/migrations")]
async fn generation_burst_is_judged_at_issuance(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Eta", false).await;
    let app = common::build_test_app(pool.clone());

    let user = seed_user(&pool, "2000000007").await;
    let (_session, jwt) = seed_session(&pool, user.id, "fp-burst").await;
    let mut token = String::new();
    for _ in 0..3 {
        let body = serde_json::json!({ "location": RIYADH });
        let response = post_json_auth(app.clone(), "/api/v1/tokens?force=true", &jwt, body).await;
        assert_eq!(response.status(), StatusCode::OK);
        token = body_json(response).await["data"]["token"].as_str().unwrap().to_string();
    }

    // Age the whole burst past a scan-anchored window without expiring
    // the live token.
    sqlx::query(
        "UPDATE shadow_tokens
         SET created_at = created_at - INTERVAL '150 seconds',
             expires_at = NOW() + INTERVAL '1 minute'",
    )
    .execute(&pool)
    .await
    .unwrap();

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-burst",
        "location": RIYADH,
    });
    let json = body_json(post_json_api_key(app, "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], true, "got {json}");
    assert_eq!(json["data"]["riskScore"], 20);
    assert!(json["data"]["anomalies"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("frequent_generation")));
}

/// Services that require identity receive the masked disclosure.
#[sqlx::test(migrations = "../db/migrations")]
async fn identity_service_gets_masked_identity(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Records Office", true).await;
    let app = common::build_test_app(pool.clone());
    let token = issue_token(app.clone(), &pool, "1098765432", "fp-id", RIYADH).await;

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-id",
        "location": RIYADH,
    });
    let json = body_json(post_json_api_key(app, "/api/v1/scan", &api_key, body).await).await;
    assert_eq!(json["data"]["verified"], true);
    assert_eq!(json["data"]["identity"]["nationalId"], "10******32");
    assert_eq!(json["data"]["identity"]["nationality"], "Saudi");
}

/// Two concurrent scans of one token: exactly one wins the claim.
#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_scans_redeem_once(pool: PgPool) {
    let (_service, api_key) = seed_service(&pool, "Checkpoint Race", false).await;
    let app = common::build_test_app(pool.clone());
    let token = issue_token(app.clone(), &pool, "2000000004", "fp-race", RIYADH).await;

    let body = serde_json::json!({
        "token": token,
        "deviceFingerprint": "fp-race",
        "location": RIYADH,
    });
    let (a, b) = futures::join!(
        post_json_api_key(app.clone(), "/api/v1/scan", &api_key, body.clone()),
        post_json_api_key(app.clone(), "/api/v1/scan", &api_key, body),
    );

    let a = body_json(a).await;
    let b = body_json(b).await;
    let verified = [&a, &b]
        .iter()
        .filter(|j| j["data"]["verified"] == true)
        .count();
    assert_eq!(verified, 1, "exactly one scanner may redeem: {a} {b}");
}
