//! Device session handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use shadowid_core::error::CoreError;

use shadowid_db::models::Session;
use shadowid_db::repositories::SessionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/sessions -- the caller's live device sessions.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Session>>>> {
    let sessions = SessionRepo::active_for_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// DELETE /api/v1/sessions/{session_id} -- revoke one of the caller's
/// sessions, e.g. to free a device slot.
pub async fn revoke(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    // Ownership check before touching anything.
    let owned = SessionRepo::active_for_user(&state.pool, user.user_id)
        .await?
        .into_iter()
        .any(|s| s.session_id == session_id);
    if !owned {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "session",
            id: session_id,
        }));
    }

    SessionRepo::revoke(&state.pool, &session_id).await?;
    tracing::info!(user_id = user.user_id, %session_id, "Session revoked by user");
    Ok(Json(DataResponse {
        data: serde_json::json!({ "revoked": true }),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRevokeRequest {
    pub session_id: Option<String>,
    pub device_fingerprint: Option<String>,
    #[serde(default)]
    pub all: bool,
}

/// POST /api/v1/sessions/revoke -- revoke sessions in bulk: one session
/// by id, every session on a device, or everything the caller holds.
/// Exactly one selector must be given.
pub async fn revoke_bulk(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<BulkRevokeRequest>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let selectors =
        usize::from(body.session_id.is_some()) + usize::from(body.device_fingerprint.is_some()) + usize::from(body.all);
    if selectors != 1 {
        return Err(AppError::Core(CoreError::Validation(
            "Provide exactly one of sessionId, deviceFingerprint or all".into(),
        )));
    }

    let revoked_count = if let Some(session_id) = &body.session_id {
        let owned = SessionRepo::active_for_user(&state.pool, user.user_id)
            .await?
            .into_iter()
            .any(|s| &s.session_id == session_id);
        if !owned {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "session",
                id: session_id.clone(),
            }));
        }
        u64::from(SessionRepo::revoke(&state.pool, session_id).await?)
    } else if let Some(fingerprint) = &body.device_fingerprint {
        SessionRepo::revoke_by_fingerprint(&state.pool, user.user_id, fingerprint).await?
    } else {
        SessionRepo::revoke_all_for_user(&state.pool, user.user_id).await?
    };

    tracing::info!(user_id = user.user_id, revoked_count, "Bulk session revoke");
    Ok(Json(DataResponse {
        data: serde_json::json!({ "revokedCount": revoked_count }),
    }))
}
