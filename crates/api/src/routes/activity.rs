//! Route definition for the audit trail.

use axum::routing::get;
use axum::Router;

use crate::handlers::activity;
use crate::state::AppState;

/// Activity routes mounted at `/activities`. Requires auth.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(activity::list))
}
