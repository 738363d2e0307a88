//! Repository for the `users` table.

use shadowid_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, national_id, name, phone, person_type, nationality, \
                        total_tokens_generated, total_verified, active_days, \
                        last_login_at, created_at";

/// Provides CRUD operations for enrolled users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (national_id, name, phone, person_type, nationality)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.national_id)
            .bind(&input.name)
            .bind(&input.phone)
            .bind(&input.person_type)
            .bind(&input.nationality)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_national_id(
        pool: &PgPool,
        national_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE national_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(national_id)
            .fetch_optional(pool)
            .await
    }

    /// Record a successful login and bump the active-day counter when
    /// this is the first login of the calendar day.
    pub async fn touch_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET active_days = active_days
                 + CASE WHEN last_login_at IS NULL
                          OR last_login_at::date < NOW()::date
                        THEN 1 ELSE 0 END,
                 last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn increment_generated(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET total_tokens_generated = total_tokens_generated + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn increment_verified(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET total_verified = total_verified + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
