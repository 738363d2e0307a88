use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use shadowid_core::types::DbId;

use crate::config::ServerConfig;
use crate::engine::oracle::ScoringOracle;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: shadowid_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// External risk-scoring oracle, behind a trait so tests can swap it.
    pub oracle: Arc<dyn ScoringOracle>,
    /// Per-user issuance locks serializing the replace-then-create step.
    pub issuance_locks: IssuanceLocks,
}

/// Per-user async mutexes handed out on demand.
///
/// Token issuance deactivates the previous active token and inserts the
/// replacement as two statements; holding the user's lock across both
/// keeps concurrent issuance requests from racing each other. The store's
/// partial unique index backstops anything that slips past (e.g. a second
/// API instance).
#[derive(Clone, Default)]
pub struct IssuanceLocks {
    inner: Arc<Mutex<HashMap<DbId, Arc<Mutex<()>>>>>,
}

impl IssuanceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or create) the lock for one user.
    pub async fn for_user(&self, user_id: DbId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        Arc::clone(map.entry(user_id).or_default())
    }
}
