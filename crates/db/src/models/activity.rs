use serde::Serialize;
use shadowid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One entry in the append-only audit trail.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: DbId,
    pub token_id: Option<DbId>,
    pub event_type: String,
    pub service: String,
    pub location: String,
    pub region: Option<String>,
    pub status: String,
    pub trace_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub occurred_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateActivity {
    pub token_id: Option<DbId>,
    pub event_type: String,
    pub service: String,
    pub location: String,
    pub region: Option<String>,
    pub status: String,
    pub trace_hash: String,
    pub metadata: Option<serde_json::Value>,
}

/// A redemption joined with its token's owner, for the cross-activity
/// travel pass.
#[derive(Debug, Clone, FromRow)]
pub struct RedemptionEvent {
    pub activity_id: DbId,
    pub token_id: DbId,
    pub user_id: DbId,
    pub location: String,
    pub occurred_at: Timestamp,
}
