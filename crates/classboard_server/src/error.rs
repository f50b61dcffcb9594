//! Error types for the server boundary.

use classboard_model::Timestamp;
use classboard_sync::SyncError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors surfaced through the document-exchange endpoints, each mapping
/// to an HTTP-style status signal.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but the role may not use this endpoint (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed or out-of-scope submission (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unknown restore point (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored document is newer; carries its clock for re-sync (409).
    #[error("conflict: stored document is newer")]
    Conflict {
        /// The stored document's logical clock.
        server_updated_at: Option<Timestamp>,
    },

    /// Roster implausibly small or shrinking (422).
    #[error("payload too small: {student_count} students (minimum {minimum})")]
    PayloadTooSmall {
        /// Students in the offending payload.
        student_count: usize,
        /// Required minimum.
        minimum: usize,
    },

    /// Writes blocked by the restore lock (423).
    #[error("writes are locked for restore")]
    Locked,

    /// Document corrupt with no healthy candidate; refused (503).
    #[error("service unavailable: document corrupt")]
    ServiceUnavailable,

    /// Anything else (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// The HTTP status signal for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::Unauthorized(_) => 401,
            ServerError::Forbidden(_) => 403,
            ServerError::BadRequest(_) => 400,
            ServerError::NotFound(_) => 404,
            ServerError::Conflict { .. } => 409,
            ServerError::PayloadTooSmall { .. } => 422,
            ServerError::Locked => 423,
            ServerError::ServiceUnavailable => 503,
            ServerError::Internal(_) => 500,
        }
    }

    /// True for statuses caused by the caller.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<SyncError> for ServerError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Rejected { reason } => ServerError::BadRequest(reason),
            SyncError::Conflict { server_updated_at } => {
                ServerError::Conflict { server_updated_at }
            }
            SyncError::PayloadTooSmall {
                student_count,
                minimum,
            } => ServerError::PayloadTooSmall {
                student_count,
                minimum,
            },
            SyncError::WritesLocked => ServerError::Locked,
            SyncError::CorruptState => ServerError::ServiceUnavailable,
            SyncError::Unauthorized(reason) => ServerError::Unauthorized(reason),
            SyncError::Model(err) => ServerError::BadRequest(err.to_string()),
            SyncError::Store(classboard_store::StoreError::UnknownRestorePoint { id }) => {
                ServerError::NotFound(format!("restore point {id}"))
            }
            SyncError::Store(classboard_store::StoreError::InvalidRestorePointId { id }) => {
                ServerError::BadRequest(format!("invalid restore point id {id}"))
            }
            SyncError::Store(err) => ServerError::Internal(err.to_string()),
        }
    }
}
