use serde::Serialize;
use shadowid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A relying service authorized to redeem tokens.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: DbId,
    pub service_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub is_active: bool,
    pub requires_identity: bool,
    pub created_at: Timestamp,
}

/// A physical or virtual location a service scans tokens from.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePortal {
    pub id: DbId,
    pub portal_id: String,
    pub service_id: DbId,
    pub name: String,
    pub location: String,
    pub address: Option<String>,
    pub region: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateService {
    pub service_id: String,
    pub name: String,
    pub description: Option<String>,
    pub api_key: String,
    pub requires_identity: bool,
}

#[derive(Debug, Clone)]
pub struct CreateServicePortal {
    pub portal_id: String,
    pub service_id: DbId,
    pub name: String,
    pub location: String,
    pub address: Option<String>,
    pub region: Option<String>,
}
