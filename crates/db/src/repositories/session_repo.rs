//! Repository for the `sessions` table.

use shadowid_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateSession, MultiIdentityDevice, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, session_id, user_id, is_active, expires_at, user_agent, \
                        ip_address, device_fingerprint, device_name, location, \
                        created_at, updated_at";

/// Provides CRUD operations for device sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (session_id, user_id, expires_at, user_agent, ip_address,
                                   device_fingerprint, device_name, location)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(&input.session_id)
            .bind(input.user_id)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .bind(&input.device_fingerprint)
            .bind(&input.device_name)
            .bind(&input.location)
            .fetch_one(pool)
            .await
    }

    /// Find an active session by its public identifier.
    ///
    /// Only returns sessions that are not revoked and not expired.
    pub async fn find_active_by_session_id(
        pool: &PgPool,
        session_id: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE session_id = $1
               AND is_active = true
               AND expires_at > NOW()"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(pool)
            .await
    }

    /// All live sessions for a user, most recent activity first.
    pub async fn active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE user_id = $1 AND is_active = true AND expires_at > NOW()
             ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Distinct device fingerprints among a user's live sessions, for
    /// the active-device cap.
    pub async fn distinct_active_fingerprints(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT device_fingerprint FROM sessions
             WHERE user_id = $1
               AND is_active = true
               AND expires_at > NOW()
               AND device_fingerprint IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(fp,)| fp).collect())
    }

    /// Revoke a single session by public identifier. Returns `true` if
    /// the row was updated.
    pub async fn revoke(pool: &PgPool, session_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = false, updated_at = NOW()
             WHERE session_id = $1 AND is_active = true",
        )
        .bind(session_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every live session tied to a fingerprint for a user, used
    /// when evicting a device. Returns the count of revoked sessions.
    pub async fn revoke_by_fingerprint(
        pool: &PgPool,
        user_id: DbId,
        fingerprint: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = false, updated_at = NOW()
             WHERE user_id = $1 AND device_fingerprint = $2 AND is_active = true",
        )
        .bind(user_id)
        .bind(fingerprint)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Revoke all live sessions for a user. Returns the count.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = false, updated_at = NOW()
             WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Bump `updated_at` so recency queries see the session as live.
    pub async fn touch(pool: &PgPool, session_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET updated_at = NOW() WHERE session_id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Fingerprints touched by more than one identity within the last
    /// `window_mins` minutes, for the detector's multi-identity pass.
    /// Only live sessions count; a revoked or lapsed session is no
    /// longer evidence of device sharing.
    pub async fn multi_identity_devices(
        pool: &PgPool,
        window_mins: i64,
    ) -> Result<Vec<MultiIdentityDevice>, sqlx::Error> {
        sqlx::query_as::<_, MultiIdentityDevice>(
            "SELECT device_fingerprint, ARRAY_AGG(DISTINCT user_id) AS user_ids
             FROM sessions
             WHERE device_fingerprint IS NOT NULL
               AND is_active = true
               AND expires_at > NOW()
               AND updated_at >= NOW() - make_interval(mins => $1::int)
             GROUP BY device_fingerprint
             HAVING COUNT(DISTINCT user_id) > 1",
        )
        .bind(window_mins)
        .fetch_all(pool)
        .await
    }
}
