//! In-memory snapshot store.

use crate::error::{StoreError, StoreResult};
use crate::snapshot::{RestorePoint, RestorePointKind, SnapshotStore};
use classboard_model::{ClockConfig, ScoreboardDocument};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::SystemTime;

/// An in-memory [`SnapshotStore`].
///
/// Used in tests and as a last-resort fallback store that survives the
/// host wiping the file system (the document lives as long as the
/// process). Keeps one restore point per save, unbounded.
pub struct MemorySnapshotStore {
    clock: ClockConfig,
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    live: Option<ScoreboardDocument>,
    snapshots: Vec<(String, ScoreboardDocument, SystemTime)>,
    meta: BTreeMap<String, (bool, String)>,
    counter: u64,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    pub fn new(clock: ClockConfig) -> Self {
        Self {
            clock,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Creates a store pre-seeded with a document.
    pub fn with_document(clock: ClockConfig, document: ScoreboardDocument) -> Self {
        let store = Self::new(clock);
        store.state.write().live = Some(document);
        store
    }
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> StoreResult<Option<ScoreboardDocument>> {
        let state = self.state.read();
        if state.live.is_some() {
            return Ok(state.live.clone());
        }
        // Best backup: newest snapshot wins, mirroring the file store.
        Ok(state.snapshots.last().map(|(_, doc, _)| doc.clone()))
    }

    fn save(&self, document: &ScoreboardDocument) -> StoreResult<()> {
        let mut state = self.state.write();
        state.counter += 1;
        let id = format!("memory/snapshot_{:06}.json", state.counter);
        state.live = Some(document.clone());
        state
            .snapshots
            .push((id, document.clone(), SystemTime::now()));
        Ok(())
    }

    fn list_restore_points(&self) -> StoreResult<Vec<RestorePoint>> {
        let state = self.state.read();
        let mut points: Vec<RestorePoint> = state
            .snapshots
            .iter()
            .map(|(id, doc, modified)| {
                let (locked, label) = state.meta.get(id).cloned().unwrap_or_default();
                RestorePoint {
                    id: id.clone(),
                    kind: RestorePointKind::Rolling,
                    modified: *modified,
                    updated_at: doc.server_updated_at,
                    student_count: doc.student_count(),
                    locked,
                    label,
                }
            })
            .collect();
        points.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(points)
    }

    fn restore(&self, id: &str) -> StoreResult<ScoreboardDocument> {
        let mut state = self.state.write();
        let mut document = state
            .snapshots
            .iter()
            .find(|(snapshot_id, _, _)| snapshot_id == id)
            .map(|(_, doc, _)| doc.clone())
            .ok_or_else(|| StoreError::UnknownRestorePoint { id: id.to_string() })?;
        // Safety copy of the current live document.
        if let Some(live) = state.live.clone() {
            state.counter += 1;
            let safety_id = format!("memory/pre_restore_{:06}.json", state.counter);
            state.snapshots.push((safety_id, live, SystemTime::now()));
        }
        document.touch(self.clock.now());
        state.live = Some(document.clone());
        Ok(document)
    }

    fn set_restore_meta(
        &self,
        id: &str,
        locked: Option<bool>,
        label: Option<String>,
    ) -> StoreResult<()> {
        let mut state = self.state.write();
        if !state.snapshots.iter().any(|(snapshot_id, _, _)| snapshot_id == id) {
            return Err(StoreError::UnknownRestorePoint { id: id.to_string() });
        }
        let entry = state.meta.entry(id.to_string()).or_default();
        if let Some(locked) = locked {
            entry.0 = locked;
        }
        if let Some(label) = label {
            entry.1 = label;
        }
        Ok(())
    }
}
