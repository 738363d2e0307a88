//! Repository for the `shadow_tokens` table.

use shadowid_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::shadow_token::{CreateShadowToken, ShadowToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token, expires_at, risk_score, risk_level, \
                        is_active, is_used, device_fingerprint, issued_location, \
                        created_at";

/// Provides CRUD operations for shadow tokens.
pub struct ShadowTokenRepo;

impl ShadowTokenRepo {
    /// Insert a new token, returning the created row.
    ///
    /// The partial unique index on `(user_id) WHERE is_active` makes this
    /// fail with a unique violation if the caller did not deactivate the
    /// user's previous token first.
    pub async fn create(
        pool: &PgPool,
        input: &CreateShadowToken,
    ) -> Result<ShadowToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO shadow_tokens (user_id, token, expires_at, device_fingerprint, issued_location)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ShadowToken>(&query)
            .bind(input.user_id)
            .bind(&input.token)
            .bind(input.expires_at)
            .bind(&input.device_fingerprint)
            .bind(&input.issued_location)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<ShadowToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM shadow_tokens WHERE token = $1");
        sqlx::query_as::<_, ShadowToken>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// The user's currently active token, if any. Expiry is not checked
    /// here; callers decide whether a stale row should be retired.
    pub async fn find_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<ShadowToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shadow_tokens
             WHERE user_id = $1 AND is_active = true"
        );
        sqlx::query_as::<_, ShadowToken>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a token string is already taken, used by the collision
    /// retry loop at issuance.
    pub async fn exists_token(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM shadow_tokens WHERE token = $1)")
                .bind(token)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Deactivate one token. Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE shadow_tokens SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Tokens created by a user since `since`, for the rate limiter.
    pub async fn count_created_since(
        pool: &PgPool,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM shadow_tokens
             WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Tokens created by a user inside a closed interval. The anomaly
    /// rules count generation bursts relative to a token's issuance, not
    /// relative to the scan that triggers the check.
    pub async fn count_created_between(
        pool: &PgPool,
        user_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM shadow_tokens
             WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Persist the outcome of a risk assessment.
    pub async fn set_risk(
        pool: &PgPool,
        id: DbId,
        risk_score: i32,
        risk_level: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE shadow_tokens SET risk_score = $2, risk_level = $3 WHERE id = $1")
            .bind(id)
            .bind(risk_score)
            .bind(risk_level)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Atomically claim a token for redemption. Returns `true` only for
    /// the caller that flipped `is_used`; concurrent scanners lose the
    /// compare-and-set and get `false`.
    pub async fn mark_used(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shadow_tokens SET is_used = true, is_active = false
             WHERE id = $1 AND is_used = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// High-risk tokens that carry a device fingerprint, regardless of
    /// age, for the detector's device-hopping pass. Deduplication
    /// against already-raised alerts keeps the result set bounded.
    pub async fn find_high_risk(pool: &PgPool) -> Result<Vec<ShadowToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shadow_tokens
             WHERE risk_level = 'High'
               AND device_fingerprint IS NOT NULL
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, ShadowToken>(&query).fetch_all(pool).await
    }

    /// High-level tokens scoring at or above `floor`, regardless of age,
    /// for the detector's high-risk-scan pass.
    pub async fn find_scored_at_least(
        pool: &PgPool,
        floor: i32,
    ) -> Result<Vec<ShadowToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shadow_tokens
             WHERE risk_level = 'High' AND risk_score >= $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, ShadowToken>(&query)
            .bind(floor)
            .fetch_all(pool)
            .await
    }
}
