//! Security alert handlers.
//!
//! Listing and resolution are authenticated like every other endpoint;
//! the manual detect trigger exists so operators (and tests) can force a
//! sweep without waiting for the background interval.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use shadowid_core::error::CoreError;
use shadowid_core::types::DbId;

use shadowid_db::models::SecurityAlert;
use shadowid_db::repositories::security_alert_repo::AlertFilter;
use shadowid_db::repositories::SecurityAlertRepo;

use crate::alerts::{run_sweep, SweepSummary};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    pub alert_type: Option<String>,
    pub severity: Option<String>,
    #[serde(default)]
    pub include_resolved: bool,
    pub limit: Option<i64>,
}

/// GET /api/v1/alerts
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<AlertQuery>,
) -> AppResult<Json<DataResponse<Vec<SecurityAlert>>>> {
    let filter = AlertFilter {
        alert_type: query.alert_type,
        severity: query.severity,
        include_resolved: query.include_resolved,
        limit: query.limit,
    };
    let alerts = SecurityAlertRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: alerts }))
}

/// POST /api/v1/alerts/{id}/resolve
pub async fn resolve(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SecurityAlert>>> {
    let alert = SecurityAlertRepo::resolve(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "alert",
                id: id.to_string(),
            })
        })?;
    Ok(Json(DataResponse { data: alert }))
}

/// POST /api/v1/alerts/detect -- run a sweep immediately.
pub async fn detect(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<SweepSummary>>> {
    let summary = run_sweep(&state.pool).await?;
    Ok(Json(DataResponse { data: summary }))
}
