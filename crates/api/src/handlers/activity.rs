//! Audit-trail listing for the authenticated user.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use shadowid_db::models::Activity;
use shadowid_db::repositories::activity_repo::ActivityFilter;
use shadowid_db::repositories::ActivityRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub event_type: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/activities -- the caller's trail, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<DataResponse<Vec<Activity>>>> {
    let filter = ActivityFilter {
        event_type: query.event_type,
        status: query.status,
        limit: query.limit,
        offset: query.offset,
    };
    let activities = ActivityRepo::list_for_user(&state.pool, user.user_id, &filter).await?;
    Ok(Json(DataResponse { data: activities }))
}
