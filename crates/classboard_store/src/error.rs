//! Error types for snapshot storage.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in snapshot storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error on the live path. Backup candidates
    /// with this problem are skipped silently instead.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document failed model validation.
    #[error("model error: {0}")]
    Model(#[from] classboard_model::ModelError),

    /// Another process holds the data directory lock.
    #[error("data directory locked: another node owns {path}")]
    DirectoryLocked {
        /// The contested directory.
        path: String,
    },

    /// A restore point id did not resolve to a known snapshot.
    #[error("unknown restore point: {id}")]
    UnknownRestorePoint {
        /// The requested id.
        id: String,
    },

    /// A restore point id attempted to escape the data directory.
    #[error("invalid restore point id: {id}")]
    InvalidRestorePointId {
        /// The offending id.
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::UnknownRestorePoint { id: "nope".into() };
        assert!(err.to_string().contains("nope"));

        let err = StoreError::DirectoryLocked {
            path: "/tmp/x".into(),
        };
        assert!(err.to_string().contains("/tmp/x"));
    }
}
