//! Activity audit-trail constants and trace hashes.
//!
//! Activities are append-only; every lifecycle event (issuance,
//! redemption attempt, expiry) writes exactly one row, including rejected
//! attempts against unknown tokens.

use crate::hashing;

/// Lifecycle event types recorded in the activity trail.
pub mod event_types {
    pub const GENERATED: &str = "generated";
    pub const USED: &str = "used";
    pub const EXPIRED: &str = "expired";
    /// Masked identity disclosed to a service that requires it.
    pub const DATA_ACCESS: &str = "data_access";
}

/// Outcome statuses for activity records.
pub mod statuses {
    pub const VERIFIED: &str = "verified";
    pub const REJECTED: &str = "rejected";
    pub const PENDING: &str = "pending";
}

/// Service name recorded for internally-generated events (issuance,
/// lazy expiry, revocation) that no external portal initiated.
pub const SYSTEM_SERVICE: &str = "ShadowID System";

/// Service name recorded for issuance from the mobile client.
pub const ISSUER_SERVICE: &str = "ShadowID App";

/// Placeholder when no location is known for an event.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Generate an opaque traceability hash for an activity record.
///
/// Format: `0x` + 64 hex chars, derived from a fresh UUID so two records
/// written in the same instant still differ.
pub fn trace_hash() -> String {
    let nonce = uuid::Uuid::new_v4();
    format!("0x{}", hashing::sha256_hex(nonce.as_bytes()))
}
