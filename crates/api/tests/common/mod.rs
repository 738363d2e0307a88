//! Shared helpers for HTTP-level integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;

use shadowid_api::auth::jwt::{generate_access_token, JwtConfig};
use shadowid_api::config::{OracleConfig, ServerConfig};
use shadowid_api::engine::oracle::{DisabledOracle, ScoringOracle};
use shadowid_api::router::build_app_router;
use shadowid_api::state::{AppState, IssuanceLocks};

use shadowid_core::types::DbId;
use shadowid_db::models::{CreateService, CreateSession, CreateUser, Service, Session, User};
use shadowid_db::repositories::{ServiceRepo, SessionRepo, UserRepo};

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        sweep_interval_secs: 300,
        jwt: JwtConfig {
            secret: "integration-test-secret-with-plenty-of-entropy".to_string(),
            access_token_expiry_mins: 60,
            session_expiry_hours: 24,
        },
        oracle: OracleConfig {
            command: None,
            timeout_secs: 5,
        },
    }
}

/// Build the full application router with the production middleware
/// stack, a disabled oracle, and the given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_oracle(pool, Arc::new(DisabledOracle))
}

/// Same as [`build_test_app`] but with an injected scoring oracle.
pub fn build_test_app_with_oracle(pool: PgPool, oracle: Arc<dyn ScoringOracle>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        oracle,
        issuance_locks: IssuanceLocks::new(),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Scan requests authenticate with an API key header instead of a JWT.
pub async fn post_json_api_key(
    app: Router,
    uri: &str,
    api_key: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-api-key", api_key)
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed helpers
// ---------------------------------------------------------------------------

/// Create a user directly in the database.
pub async fn seed_user(pool: &PgPool, national_id: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            national_id: national_id.to_string(),
            name: format!("Test User {national_id}"),
            phone: "+966500000000".to_string(),
            person_type: "Citizen".to_string(),
            nationality: "Saudi".to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Create a live session for a user and return it with a signed JWT.
pub async fn seed_session(pool: &PgPool, user_id: DbId, fingerprint: &str) -> (Session, String) {
    let session = SessionRepo::create(
        pool,
        &CreateSession {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: chrono::Utc::now() + chrono::Duration::hours(24),
            user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)".to_string()),
            ip_address: None,
            device_fingerprint: Some(fingerprint.to_string()),
            device_name: Some("iPhone".to_string()),
            location: None,
        },
    )
    .await
    .expect("session creation should succeed");

    let token = generate_access_token(user_id, &session.session_id, &test_config().jwt)
        .expect("token signing should succeed");
    (session, token)
}

/// Register a relying service and return it with its API key.
pub async fn seed_service(pool: &PgPool, name: &str, requires_identity: bool) -> (Service, String) {
    let api_key = format!("svc-key-{}", uuid::Uuid::new_v4());
    let service = ServiceRepo::create(
        pool,
        &CreateService {
            service_id: format!("svc-{}", uuid::Uuid::new_v4()),
            name: name.to_string(),
            description: None,
            api_key: api_key.clone(),
            requires_identity,
        },
    )
    .await
    .expect("service creation should succeed");
    (service, api_key)
}
