//! Route definitions for device sessions.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes mounted at `/sessions`. All require auth.
///
/// ```text
/// GET    /               -> list
/// POST   /revoke         -> revoke_bulk
/// DELETE /{session_id}   -> revoke
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sessions::list))
        .route("/revoke", post(sessions::revoke_bulk))
        .route("/{session_id}", delete(sessions::revoke))
}
