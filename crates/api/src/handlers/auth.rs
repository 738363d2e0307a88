//! Login and logout handlers.
//!
//! Login is national-id based with auto-enrollment for unknown ids, as
//! the upstream identity provider has already vouched for the caller by
//! the time this endpoint is reached. A device session is created on
//! every login and the returned JWT is bound to it.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shadowid_core::error::CoreError;
use shadowid_core::fingerprint::{self, FingerprintSignals};
use shadowid_core::identity::mask_national_id;

use shadowid_db::models::{CreateSession, CreateUser, User};
use shadowid_db::repositories::{SessionRepo, UserRepo};

use crate::auth::jwt::generate_access_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 10, max = 10, message = "nationalId must be 10 digits"))]
    pub national_id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Client-computed opaque fingerprint, when the client has one.
    pub device_fingerprint: Option<String>,
    /// Free-form location or `lat,lon` coordinates.
    pub location: Option<String>,
    pub screen_hint: Option<String>,
    pub timezone_hint: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub session_id: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: shadowid_core::types::DbId,
    pub name: String,
    pub national_id_display: String,
    pub person_type: String,
    pub nationality: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    body.validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    if !body.national_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::Core(CoreError::Validation(
            "nationalId must be 10 digits".into(),
        )));
    }

    let user = find_or_create_user(&state, &body).await?;

    let user_agent = header_str(&headers, "user-agent").unwrap_or_default();
    let signals = FingerprintSignals {
        user_agent,
        accept_language: header_str(&headers, "accept-language"),
        accept_encoding: header_str(&headers, "accept-encoding"),
        screen_hint: body.screen_hint.as_deref(),
        timezone_hint: body.timezone_hint.as_deref(),
    };
    let device_fingerprint = fingerprint::resolve(body.device_fingerprint.as_deref(), &signals);

    // Active-device cap: a login from a novel device is refused once the
    // user already has the maximum distinct devices with live sessions.
    let fingerprints = SessionRepo::distinct_active_fingerprints(&state.pool, user.id).await?;
    if fingerprints.len() >= shadowid_core::token::MAX_ACTIVE_DEVICES
        && !fingerprints.iter().any(|f| f == &device_fingerprint)
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "Active device limit reached. Sign out another device first.".into(),
        )));
    }

    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            session_id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::hours(state.config.jwt.session_expiry_hours),
            user_agent: Some(user_agent.to_string()).filter(|ua| !ua.is_empty()),
            ip_address: header_str(&headers, "x-forwarded-for").map(String::from),
            device_fingerprint: Some(device_fingerprint),
            device_name: Some(fingerprint::device_name(user_agent).to_string()),
            location: body.location.clone(),
        },
    )
    .await?;

    UserRepo::touch_login(&state.pool, user.id).await?;

    let access_token = generate_access_token(user.id, &session.session_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Failed to sign access token: {e}")))?;

    tracing::info!(user_id = user.id, session_id = %session.session_id, "User logged in");

    Ok(Json(DataResponse {
        data: LoginResponse {
            access_token,
            session_id: session.session_id,
            user: LoginUser {
                id: user.id,
                name: user.name,
                national_id_display: mask_national_id(&user.national_id),
                person_type: user.person_type,
                nationality: user.nationality,
            },
        },
    }))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    SessionRepo::revoke(&state.pool, &user.session_id).await?;
    tracing::info!(user_id = user.user_id, session_id = %user.session_id, "User logged out");
    Ok(Json(DataResponse {
        data: serde_json::json!({ "loggedOut": true }),
    }))
}

async fn find_or_create_user(state: &AppState, body: &LoginRequest) -> AppResult<User> {
    if let Some(user) = UserRepo::find_by_national_id(&state.pool, &body.national_id).await? {
        return Ok(user);
    }

    let name = body
        .name
        .clone()
        .unwrap_or_else(|| format!("User {}", mask_national_id(&body.national_id)));
    let created = UserRepo::create(
        &state.pool,
        &CreateUser {
            national_id: body.national_id.clone(),
            name,
            phone: body.phone.clone().unwrap_or_default(),
            person_type: "Citizen".into(),
            nationality: "Saudi".into(),
        },
    )
    .await?;
    tracing::info!(user_id = created.id, "Enrolled new user");
    Ok(created)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
