//! Repository for the `security_alerts` table.

use shadowid_core::types::DbId;
use sqlx::PgPool;

use crate::models::security_alert::{CreateSecurityAlert, SecurityAlert};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, alert_type, severity, title, description, user_id, token_id, \
                        location, region, metadata, is_resolved, resolved_at, created_at";

/// Query filters for the alert listing endpoint.
#[derive(Debug, Default, Clone)]
pub struct AlertFilter {
    pub alert_type: Option<String>,
    pub severity: Option<String>,
    pub include_resolved: bool,
    pub limit: Option<i64>,
}

/// Provides CRUD operations for security alerts.
pub struct SecurityAlertRepo;

impl SecurityAlertRepo {
    /// Insert a new alert, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSecurityAlert,
    ) -> Result<SecurityAlert, sqlx::Error> {
        let query = format!(
            "INSERT INTO security_alerts
                 (alert_type, severity, title, description, user_id, token_id, location, region, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(&input.alert_type)
            .bind(&input.severity)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.user_id)
            .bind(input.token_id)
            .bind(&input.location)
            .bind(&input.region)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// List alerts, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &AlertFilter,
    ) -> Result<Vec<SecurityAlert>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(50).clamp(1, 200);
        let query = format!(
            "SELECT {COLUMNS} FROM security_alerts
             WHERE ($1::text IS NULL OR alert_type = $1)
               AND ($2::text IS NULL OR severity = $2)
               AND ($3::bool OR is_resolved = false)
             ORDER BY created_at DESC
             LIMIT $4"
        );
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(&filter.alert_type)
            .bind(&filter.severity)
            .bind(filter.include_resolved)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark an alert resolved. Returns the updated row, or `None` if the
    /// alert does not exist or was already resolved.
    pub async fn resolve(pool: &PgPool, id: DbId) -> Result<Option<SecurityAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE security_alerts
             SET is_resolved = true, resolved_at = NOW()
             WHERE id = $1 AND is_resolved = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether an alert of `alert_type` was ever raised for this token,
    /// resolved or not. Token-scoped passes key on this so a resolved
    /// alert is not re-raised for the same immutable evidence.
    pub async fn exists_for_token(
        pool: &PgPool,
        alert_type: &str,
        token_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM security_alerts
                 WHERE alert_type = $1 AND token_id = $2
             )",
        )
        .bind(alert_type)
        .bind(token_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Whether an unresolved alert of `alert_type` already targets this
    /// user. Used to deduplicate detector passes keyed by user.
    pub async fn exists_unresolved_for_user(
        pool: &PgPool,
        alert_type: &str,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM security_alerts
                 WHERE alert_type = $1 AND user_id = $2 AND is_resolved = false
             )",
        )
        .bind(alert_type)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Whether an unresolved alert of `alert_type` already references a
    /// fingerprint in its metadata. Used by the multi-identity pass,
    /// which has no single user or token to key on.
    pub async fn exists_unresolved_for_fingerprint(
        pool: &PgPool,
        alert_type: &str,
        fingerprint: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM security_alerts
                 WHERE alert_type = $1
                   AND metadata ->> 'fingerprint' = $2
                   AND is_resolved = false
             )",
        )
        .bind(alert_type)
        .bind(fingerprint)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
