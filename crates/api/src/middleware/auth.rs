//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shadowid_core::error::CoreError;
use shadowid_core::types::DbId;

use shadowid_db::repositories::SessionRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Validates the signature, then checks the session named in the `sid`
/// claim is still live. A revoked or expired session rejects the token
/// immediately, regardless of the JWT's own `exp`. The session's
/// `updated_at` is bumped as a side effect so the detector's recency
/// windows see the device as active.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// Public identifier of the device session (from `claims.sid`).
    pub session_id: String,
    /// Fingerprint the session was created with, if any.
    pub device_fingerprint: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let session = SessionRepo::find_active_by_session_id(&state.pool, &claims.sid)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Session revoked or expired".into()))
            })?;

        SessionRepo::touch(&state.pool, &session.session_id).await?;

        Ok(AuthUser {
            user_id: claims.sub,
            session_id: session.session_id,
            device_fingerprint: session.device_fingerprint,
        })
    }
}
