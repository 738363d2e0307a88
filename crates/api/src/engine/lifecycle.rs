//! Token issuance and lifecycle management.
//!
//! A user holds at most one active token at a time. Issuance hands back
//! the existing unexpired token unless a replacement is forced; a forced
//! issue retires the previous token, enforces the rate limit and the
//! active-device cap, then retries string generation until an unused
//! value is found.
//! Expiry is reconciled lazily: any read of an active token re-checks
//! `expires_at` and retires the row on the spot if it has lapsed.

use chrono::{Duration, Utc};

use shadowid_core::activity::{event_types, statuses, trace_hash, ISSUER_SERVICE, SYSTEM_SERVICE};
use shadowid_core::error::CoreError;
use shadowid_core::region::region_for_location;
use shadowid_core::token::{
    generate_token_string, is_expired, MAX_ACTIVE_DEVICES, MAX_GENERATION_ATTEMPTS,
    RATE_LIMIT_MAX_TOKENS, RATE_LIMIT_RETRY_AFTER_SECS, RATE_LIMIT_WINDOW_SECS, TOKEN_TTL_SECS,
};
use shadowid_core::types::DbId;

use shadowid_db::models::{CreateActivity, CreateShadowToken, ShadowToken};
use shadowid_db::repositories::{ActivityRepo, SessionRepo, ShadowTokenRepo, UserRepo};
use shadowid_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Parameters for one issuance request.
#[derive(Debug)]
pub struct IssueParams {
    pub user_id: DbId,
    pub force_new: bool,
    pub device_fingerprint: Option<String>,
    pub location: Option<String>,
}

/// Issue a token for a user.
///
/// Without `force_new`, an unexpired active token is returned as-is
/// instead of minting a replacement; reuse does not count against the
/// rate limit. With `force_new`, the previous token is retired and a
/// fresh one minted.
///
/// Serialized per user via [`crate::state::IssuanceLocks`] so two
/// concurrent requests cannot both pass the checks and insert; the
/// partial unique index turns any remaining race into a 409.
pub async fn issue_token(state: &AppState, params: IssueParams) -> AppResult<ShadowToken> {
    let lock = state.issuance_locks.for_user(params.user_id).await;
    let _guard = lock.lock().await;

    let pool = &state.pool;
    let now = Utc::now();

    let previous = ShadowTokenRepo::find_active_for_user(pool, params.user_id).await?;

    if let Some(previous) = &previous {
        if !params.force_new && !is_expired(previous.expires_at, now) {
            tracing::debug!(
                user_id = params.user_id,
                token_id = previous.id,
                "Returning existing active token"
            );
            return Ok(previous.clone());
        }
    }

    // Rate limit: a trailing window over creations, counted before this one.
    let window_start = now - Duration::seconds(RATE_LIMIT_WINDOW_SECS);
    let recent = ShadowTokenRepo::count_created_since(pool, params.user_id, window_start).await?;
    if recent >= RATE_LIMIT_MAX_TOKENS {
        return Err(AppError::RateLimited {
            retry_after_secs: RATE_LIMIT_RETRY_AFTER_SECS,
        });
    }

    // Active-device cap: a novel fingerprint is refused once the user
    // already has the maximum distinct devices with live sessions.
    if let Some(fp) = params.device_fingerprint.as_deref() {
        let fingerprints = SessionRepo::distinct_active_fingerprints(pool, params.user_id).await?;
        if fingerprints.len() >= MAX_ACTIVE_DEVICES && !fingerprints.iter().any(|f| f == fp) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Active device limit reached. Sign out another device first.".into(),
            )));
        }
    }

    // Retire the previous token. If it had quietly expired, the trail
    // gets its expiry record now rather than never.
    if let Some(previous) = previous {
        ShadowTokenRepo::deactivate(pool, previous.id).await?;
        if is_expired(previous.expires_at, now) {
            record_expiry(pool, &previous).await?;
        }
    }

    // Collision retry loop, failing closed on exhaustion.
    let mut token_string = None;
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let candidate = generate_token_string();
        if !ShadowTokenRepo::exists_token(pool, &candidate).await? {
            token_string = Some(candidate);
            break;
        }
    }
    let token_string = token_string.ok_or_else(|| {
        AppError::InternalError("Token generation exhausted collision retries".into())
    })?;

    let created = ShadowTokenRepo::create(
        pool,
        &CreateShadowToken {
            user_id: params.user_id,
            token: token_string,
            expires_at: now + Duration::seconds(TOKEN_TTL_SECS),
            device_fingerprint: params.device_fingerprint,
            issued_location: params.location,
        },
    )
    .await?;

    UserRepo::increment_generated(pool, params.user_id).await?;

    let location = created
        .issued_location
        .clone()
        .unwrap_or_else(|| shadowid_core::activity::UNKNOWN_LOCATION.to_string());
    ActivityRepo::create(
        pool,
        &CreateActivity {
            token_id: Some(created.id),
            event_type: event_types::GENERATED.into(),
            service: ISSUER_SERVICE.into(),
            region: region_for_location(&location).map(String::from),
            location,
            status: statuses::VERIFIED.into(),
            trace_hash: trace_hash(),
            metadata: None,
        },
    )
    .await?;

    tracing::info!(user_id = params.user_id, token_id = created.id, "Issued shadow token");
    Ok(created)
}

/// The user's active token, reconciling lazy expiry on read.
pub async fn get_active_token(pool: &DbPool, user_id: DbId) -> AppResult<Option<ShadowToken>> {
    let Some(token) = ShadowTokenRepo::find_active_for_user(pool, user_id).await? else {
        return Ok(None);
    };

    if is_expired(token.expires_at, Utc::now()) {
        ShadowTokenRepo::deactivate(pool, token.id).await?;
        record_expiry(pool, &token).await?;
        return Ok(None);
    }

    Ok(Some(token))
}

/// Revoke the user's active token ahead of its expiry.
///
/// Returns `true` if a token was retired, `false` if none was active.
pub async fn revoke_active_token(pool: &DbPool, user_id: DbId) -> AppResult<bool> {
    let Some(token) = ShadowTokenRepo::find_active_for_user(pool, user_id).await? else {
        return Ok(false);
    };

    ShadowTokenRepo::deactivate(pool, token.id).await?;
    record_expiry(pool, &token).await?;
    tracing::info!(user_id, token_id = token.id, "Revoked shadow token");
    Ok(true)
}

/// Lifecycle state of a token as presented by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Active,
    Used,
    Expired,
    Revoked,
}

/// Classify a stored token, reconciling lazy expiry as a side effect.
pub async fn token_state(pool: &DbPool, token: &ShadowToken) -> AppResult<TokenState> {
    if token.is_used {
        return Ok(TokenState::Used);
    }
    if is_expired(token.expires_at, Utc::now()) {
        if token.is_active {
            ShadowTokenRepo::deactivate(pool, token.id).await?;
            record_expiry(pool, token).await?;
        }
        return Ok(TokenState::Expired);
    }
    if !token.is_active {
        return Ok(TokenState::Revoked);
    }
    Ok(TokenState::Active)
}

/// Write the expiry record for a retired token.
async fn record_expiry(pool: &DbPool, token: &ShadowToken) -> Result<(), sqlx::Error> {
    let location = token
        .issued_location
        .clone()
        .unwrap_or_else(|| shadowid_core::activity::UNKNOWN_LOCATION.to_string());
    ActivityRepo::create(
        pool,
        &CreateActivity {
            token_id: Some(token.id),
            event_type: event_types::EXPIRED.into(),
            service: SYSTEM_SERVICE.into(),
            region: region_for_location(&location).map(String::from),
            location,
            status: statuses::VERIFIED.into(),
            trace_hash: trace_hash(),
            metadata: None,
        },
    )
    .await?;
    Ok(())
}
