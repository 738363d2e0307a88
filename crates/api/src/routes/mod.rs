pub mod activity;
pub mod alerts;
pub mod auth;
pub mod health;
pub mod scan;
pub mod sessions;
pub mod tokens;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                  login (public)
/// /auth/logout                 logout (requires auth)
///
/// /tokens                      issue (POST, ?force=true for a fresh one)
/// /tokens/active               current token (GET), revoke (DELETE)
/// /tokens/{token}              detail with trail (GET)
/// /tokens/{token}/status       lifecycle state (GET)
///
/// /scan                        redeem a token (POST, X-Api-Key)
///
/// /sessions                    list live device sessions (GET)
/// /sessions/revoke             bulk revoke by id, device or all (POST)
/// /sessions/{session_id}       revoke one session (DELETE)
///
/// /activities                  audit trail (GET)
///
/// /alerts                      list alerts (GET)
/// /alerts/{id}/resolve         resolve (POST)
/// /alerts/detect               run a sweep now (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/tokens", tokens::router())
        .nest("/scan", scan::router())
        .nest("/sessions", sessions::router())
        .nest("/activities", activity::router())
        .nest("/alerts", alerts::router())
}
