use serde::Serialize;
use shadowid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A short-lived single-use token standing in for a real identity.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token: String,
    pub expires_at: Timestamp,
    pub risk_score: i32,
    pub risk_level: String,
    pub is_active: bool,
    pub is_used: bool,
    pub device_fingerprint: Option<String>,
    pub issued_location: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateShadowToken {
    pub user_id: DbId,
    pub token: String,
    pub expires_at: Timestamp,
    pub device_fingerprint: Option<String>,
    pub issued_location: Option<String>,
}
