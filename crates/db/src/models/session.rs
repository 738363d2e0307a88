use serde::Serialize;
use shadowid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// An authenticated device session.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: DbId,
    pub session_id: String,
    pub user_id: DbId,
    pub is_active: bool,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub device_fingerprint: Option<String>,
    pub device_name: Option<String>,
    pub location: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateSession {
    pub session_id: String,
    pub user_id: DbId,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub device_fingerprint: Option<String>,
    pub device_name: Option<String>,
    pub location: Option<String>,
}

/// A device fingerprint recently shared by more than one identity.
/// Produced by the multi-identity grouping query for the detector sweep.
#[derive(Debug, Clone, FromRow)]
pub struct MultiIdentityDevice {
    pub device_fingerprint: String,
    pub user_ids: Vec<DbId>,
}
