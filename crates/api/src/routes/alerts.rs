//! Route definitions for security alerts.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

/// Alert routes mounted at `/alerts`. All require auth.
///
/// ```text
/// GET  /                 -> list
/// POST /{id}/resolve     -> resolve
/// POST /detect           -> detect (run a sweep immediately)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alerts::list))
        .route("/{id}/resolve", post(alerts::resolve))
        .route("/detect", post(alerts::detect))
}
