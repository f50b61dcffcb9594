//! Error types for the sync engine.

use classboard_model::Timestamp;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in the sync engine.
///
/// The taxonomy follows the write pipeline: rejected writes and conflicts
/// are surfaced to the caller with nothing persisted; corrupt state is
/// refused rather than served; best-effort replication failures never
/// appear here at all (they are logged and swallowed).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Role scope violation, missing identity or schema mismatch.
    #[error("rejected write: {reason}")]
    Rejected {
        /// Why the write was rejected.
        reason: String,
    },

    /// Incoming document is older than the stored one. Carries the
    /// stored clock so the caller can re-sync and retry.
    #[error("conflict: stored document is newer")]
    Conflict {
        /// The stored document's logical clock.
        server_updated_at: Option<Timestamp>,
    },

    /// Incoming roster is implausibly small or shrinks the stored one.
    #[error("payload too small: {student_count} students (minimum {minimum})")]
    PayloadTooSmall {
        /// Students in the offending payload.
        student_count: usize,
        /// Configured minimum.
        minimum: usize,
    },

    /// All writes are temporarily blocked by the restore lock.
    #[error("writes are locked for restore")]
    WritesLocked,

    /// Document fails the tiny-roster check even after recovery
    /// attempts; refused rather than served.
    #[error("stored document is corrupt and no healthy candidate exists")]
    CorruptState,

    /// Caller could not be authenticated or lacks the required role.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Snapshot store failure.
    #[error("store error: {0}")]
    Store(#[from] classboard_store::StoreError),

    /// Document failed parsing or validation.
    #[error("model error: {0}")]
    Model(#[from] classboard_model::ModelError),
}

impl SyncError {
    /// Shorthand for a rejected write.
    pub fn rejected(reason: impl Into<String>) -> Self {
        SyncError::Rejected {
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input or credentials.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SyncError::Rejected { .. }
                | SyncError::Conflict { .. }
                | SyncError::PayloadTooSmall { .. }
                | SyncError::WritesLocked
                | SyncError::Unauthorized(_)
                | SyncError::Model(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(SyncError::rejected("out of scope").is_client_error());
        assert!(SyncError::WritesLocked.is_client_error());
        assert!(!SyncError::CorruptState.is_client_error());
    }

    #[test]
    fn display_carries_detail() {
        let err = SyncError::PayloadTooSmall {
            student_count: 20,
            minimum: 25,
        };
        let msg = err.to_string();
        assert!(msg.contains("20"));
        assert!(msg.contains("25"));
    }
}
