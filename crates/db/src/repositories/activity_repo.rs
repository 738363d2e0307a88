//! Repository for the `activities` audit trail.

use shadowid_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::activity::{Activity, CreateActivity, RedemptionEvent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, token_id, event_type, service, location, region, status, trace_hash, metadata, occurred_at";

/// Hard ceiling on page size for listing endpoints.
const MAX_PAGE_SIZE: i64 = 100;

/// Query filters for listing a user's activity trail.
#[derive(Debug, Default, Clone)]
pub struct ActivityFilter {
    pub event_type: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Append-only writer and reader for audit activities.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Insert a new activity, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateActivity) -> Result<Activity, sqlx::Error> {
        let query = format!(
            "INSERT INTO activities (token_id, event_type, service, location, region, status, trace_hash, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(input.token_id)
            .bind(&input.event_type)
            .bind(&input.service)
            .bind(&input.location)
            .bind(&input.region)
            .bind(&input.status)
            .bind(&input.trace_hash)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// A user's trail, newest first, joined through token ownership.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        filter: &ActivityFilter,
    ) -> Result<Vec<Activity>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);
        let offset = filter.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT a.id, a.token_id, a.event_type, a.service, a.location, a.region,
                    a.status, a.trace_hash, a.metadata, a.occurred_at
             FROM activities a
             JOIN shadow_tokens t ON t.id = a.token_id
             WHERE t.user_id = $1
               AND ($2::text IS NULL OR a.event_type = $2)
               AND ($3::text IS NULL OR a.status = $3)
             ORDER BY a.occurred_at DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(user_id)
            .bind(&filter.event_type)
            .bind(&filter.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every activity recorded against one token, oldest first.
    pub async fn list_for_token(
        pool: &PgPool,
        token_id: DbId,
    ) -> Result<Vec<Activity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activities
             WHERE token_id = $1
             ORDER BY occurred_at ASC"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(token_id)
            .fetch_all(pool)
            .await
    }

    /// Verified redemptions since `since` joined with the owning user,
    /// ordered per user by time. Feeds the cross-activity travel pass.
    pub async fn redemptions_since(
        pool: &PgPool,
        since: Timestamp,
    ) -> Result<Vec<RedemptionEvent>, sqlx::Error> {
        sqlx::query_as::<_, RedemptionEvent>(
            "SELECT a.id AS activity_id, t.id AS token_id, t.user_id, a.location, a.occurred_at
             FROM activities a
             JOIN shadow_tokens t ON t.id = a.token_id
             WHERE a.event_type = 'used'
               AND a.status = 'verified'
               AND a.occurred_at >= $1
             ORDER BY t.user_id, a.occurred_at ASC",
        )
        .bind(since)
        .fetch_all(pool)
        .await
    }
}
