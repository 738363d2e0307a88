//! Route definition for token redemption.

use axum::routing::post;
use axum::Router;

use crate::handlers::scan;
use crate::state::AppState;

/// Scan route mounted at `/scan`. Authenticated by `X-Api-Key`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(scan::scan))
}
