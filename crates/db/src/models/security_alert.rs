use serde::Serialize;
use shadowid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A correlated security finding produced by the detector sweep or
/// recorded inline at scan time.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    pub id: DbId,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub user_id: Option<DbId>,
    pub token_id: Option<DbId>,
    pub location: Option<String>,
    pub region: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub is_resolved: bool,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateSecurityAlert {
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub user_id: Option<DbId>,
    pub token_id: Option<DbId>,
    pub location: Option<String>,
    pub region: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
