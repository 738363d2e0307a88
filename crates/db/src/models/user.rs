use serde::Serialize;
use shadowid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A citizen or resident enrolled with the platform.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub national_id: String,
    pub name: String,
    pub phone: String,
    pub person_type: String,
    pub nationality: String,
    pub total_tokens_generated: i32,
    pub total_verified: i32,
    pub active_days: i32,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub national_id: String,
    pub name: String,
    pub phone: String,
    pub person_type: String,
    pub nationality: String,
}
