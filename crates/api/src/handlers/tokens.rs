//! Token lifecycle handlers for the authenticated mobile client.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use shadowid_core::error::CoreError;

use shadowid_db::models::{Activity, ShadowToken};
use shadowid_db::repositories::{ActivityRepo, ShadowTokenRepo};

use crate::engine::lifecycle::{self, IssueParams, TokenState};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Free-form location or `lat,lon` coordinates of the issuing device.
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueQuery {
    /// Mint a replacement even when an unexpired token is still active.
    #[serde(default)]
    pub force: bool,
}

/// POST /api/v1/tokens -- issue a token. Returns the existing active
/// token unless `?force=true` demands a fresh one.
pub async fn issue(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IssueQuery>,
    Json(body): Json<IssueRequest>,
) -> AppResult<Json<DataResponse<ShadowToken>>> {
    let token = lifecycle::issue_token(
        &state,
        IssueParams {
            user_id: user.user_id,
            force_new: query.force,
            device_fingerprint: user.device_fingerprint,
            location: body.location,
        },
    )
    .await?;
    Ok(Json(DataResponse { data: token }))
}

/// GET /api/v1/tokens/active -- the caller's current token, if any.
pub async fn active(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Option<ShadowToken>>>> {
    let token = lifecycle::get_active_token(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: token }))
}

/// DELETE /api/v1/tokens/active -- revoke the caller's current token.
pub async fn revoke(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let revoked = lifecycle::revoke_active_token(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "revoked": revoked }),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub token: String,
    pub state: TokenState,
    pub risk_score: i32,
    pub risk_level: String,
    pub expires_at: shadowid_core::types::Timestamp,
    /// Seconds of lifetime left; zero once the token is no longer active.
    pub remaining_secs: i64,
}

/// GET /api/v1/tokens/{token}/status
///
/// Owner-scoped: callers can only inspect their own tokens.
pub async fn status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<TokenStatus>>> {
    let stored = find_owned_token(&state, &user, &token).await?;
    let token_state = lifecycle::token_state(&state.pool, &stored).await?;
    let remaining_secs = match token_state {
        TokenState::Active => (stored.expires_at - Utc::now()).num_seconds().max(0),
        _ => 0,
    };

    Ok(Json(DataResponse {
        data: TokenStatus {
            token: stored.token,
            state: token_state,
            risk_score: stored.risk_score,
            risk_level: stored.risk_level,
            expires_at: stored.expires_at,
            remaining_secs,
        },
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetail {
    #[serde(flatten)]
    pub token: ShadowToken,
    pub state: TokenState,
    pub activities: Vec<Activity>,
}

/// GET /api/v1/tokens/{token} -- full detail with the audit trail.
pub async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<TokenDetail>>> {
    let stored = find_owned_token(&state, &user, &token).await?;
    let token_state = lifecycle::token_state(&state.pool, &stored).await?;
    let activities = ActivityRepo::list_for_token(&state.pool, stored.id).await?;

    Ok(Json(DataResponse {
        data: TokenDetail {
            token: stored,
            state: token_state,
            activities,
        },
    }))
}

async fn find_owned_token(
    state: &AppState,
    user: &AuthUser,
    token: &str,
) -> AppResult<ShadowToken> {
    let stored = ShadowTokenRepo::find_by_token(&state.pool, token)
        .await?
        .filter(|t| t.user_id == user.user_id)
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "token",
                id: token.to_string(),
            })
        })?;
    Ok(stored)
}
