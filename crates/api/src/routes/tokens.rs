//! Route definitions for the token lifecycle.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tokens;
use crate::state::AppState;

/// Token routes mounted at `/tokens`. All require auth.
///
/// ```text
/// POST   /                   -> issue
/// GET    /active             -> active
/// DELETE /active             -> revoke
/// GET    /{token}            -> detail
/// GET    /{token}/status     -> status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tokens::issue))
        .route("/active", get(tokens::active).delete(tokens::revoke))
        .route("/{token}", get(tokens::detail))
        .route("/{token}/status", get(tokens::status))
}
