//! Snapshot store trait and restore-point catalog types.

use crate::error::StoreResult;
use classboard_model::{ScoreboardDocument, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Where a restore point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePointKind {
    /// The live document itself.
    Live,
    /// A rolling backup taken after a save.
    Rolling,
    /// An hourly immutable snapshot.
    Hourly,
    /// A snapshot taken at process startup.
    Startup,
    /// A safety copy written immediately before a restore.
    PreRestore,
}

/// One entry in the restore-point catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorePoint {
    /// Stable id usable with [`SnapshotStore::restore`].
    pub id: String,
    /// Origin of the snapshot.
    pub kind: RestorePointKind,
    /// File modification time.
    pub modified: SystemTime,
    /// The snapshot's logical clock, when readable.
    pub updated_at: Option<Timestamp>,
    /// Student count, when readable (0 for malformed snapshots).
    pub student_count: usize,
    /// Lock flag. Informational: retention pruning skips locked rolling
    /// and hourly files, and the catalog never auto-deletes a listed
    /// point while enumerating.
    pub locked: bool,
    /// Free-text label.
    pub label: String,
}

/// A single-document snapshot store.
///
/// Implementations must be safe to share across request-handling threads;
/// all mutation goes through interior synchronization.
pub trait SnapshotStore: Send + Sync {
    /// Returns the current document, falling back to the best readable
    /// backup when the primary is absent or unreadable. `Ok(None)` means
    /// no snapshot of any kind exists.
    fn load(&self) -> StoreResult<Option<ScoreboardDocument>>;

    /// Persists the document atomically and rotates backups.
    fn save(&self, document: &ScoreboardDocument) -> StoreResult<()>;

    /// Enumerates live file, rolling backups, hourly snapshots, startup
    /// snapshots and pre-restore copies, newest first.
    fn list_restore_points(&self) -> StoreResult<Vec<RestorePoint>>;

    /// Installs the chosen snapshot as the live document, writing a
    /// pre-restore safety copy of the current live document first, and
    /// bumps the logical clock. Returns the installed document.
    fn restore(&self, id: &str) -> StoreResult<ScoreboardDocument>;

    /// Updates lock flag and/or label for a restore point.
    fn set_restore_meta(
        &self,
        id: &str,
        locked: Option<bool>,
        label: Option<String>,
    ) -> StoreResult<()>;
}
