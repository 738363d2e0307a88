//! Domain error type shared by the repository and API layers.

/// Domain-level error. Expected business rejections (expired, already
/// used, rate limited, high risk) are NOT errors -- they are modelled as
/// typed outcomes by the callers. This enum covers genuine faults and
/// request-level problems.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came back empty. `id` is whatever key the
    /// lookup used (a database id, a token string, a session id).
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Input failed validation before any state was touched.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness or state conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An unrecoverable internal fault (e.g. token generation exhausted
    /// its collision retries).
    #[error("Internal error: {0}")]
    Internal(String),
}
