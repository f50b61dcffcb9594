//! File-backed snapshot store.
//!
//! Directory layout:
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK                                   # advisory single-node lock
//! ├─ offline_scoreboard_data.json           # live document
//! ├─ offline_scoreboard_data.pre_restore_*  # pre-restore safety copies
//! ├─ offline_scoreboard_backups/            # rolling backups (bounded)
//! ├─ offline_scoreboard_hourly_backups/     # hourly snapshots (bounded)
//! ├─ startup_restore_points/                # one snapshot per boot
//! └─ restore_meta.json                      # lock/label sidecar
//! ```
//!
//! All writes go through temp-write-then-rename so no reader ever
//! observes a half-written document.

use crate::error::{StoreError, StoreResult};
use crate::snapshot::{RestorePoint, RestorePointKind, SnapshotStore};
use classboard_model::{ClockConfig, ScoreboardDocument};
use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const LIVE_FILE: &str = "offline_scoreboard_data.json";
const LOCK_FILE: &str = "LOCK";
const META_FILE: &str = "restore_meta.json";
const ROLLING_DIR: &str = "offline_scoreboard_backups";
const HOURLY_DIR: &str = "offline_scoreboard_hourly_backups";
const STARTUP_DIR: &str = "startup_restore_points";
const PRE_RESTORE_PREFIX: &str = "offline_scoreboard_data.pre_restore_";

/// Retention configuration for the file store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Rolling backups kept beyond locked ones.
    pub rolling_keep: usize,
    /// Hourly snapshots kept beyond locked ones.
    pub hourly_keep: usize,
    /// Startup snapshots kept.
    pub startup_keep: usize,
    /// Clock used to stamp backup names and restored documents.
    pub clock: ClockConfig,
}

impl StoreConfig {
    /// Creates a configuration with default retention.
    pub fn new(clock: ClockConfig) -> Self {
        Self {
            rolling_keep: 20,
            hourly_keep: 48,
            startup_keep: 10,
            clock,
        }
    }

    /// Sets the rolling backup retention count.
    #[must_use]
    pub fn with_rolling_keep(mut self, keep: usize) -> Self {
        self.rolling_keep = keep;
        self
    }

    /// Sets the hourly snapshot retention count.
    #[must_use]
    pub fn with_hourly_keep(mut self, keep: usize) -> Self {
        self.hourly_keep = keep;
        self
    }

    /// Sets the startup snapshot retention count.
    #[must_use]
    pub fn with_startup_keep(mut self, keep: usize) -> Self {
        self.startup_keep = keep;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RestoreMeta {
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    label: String,
}

type MetaMap = BTreeMap<String, RestoreMeta>;

/// File-backed [`SnapshotStore`].
///
/// Holds an exclusive advisory lock on the data directory so two nodes
/// never share one live file.
pub struct FileSnapshotStore {
    root: PathBuf,
    config: StoreConfig,
    io: Mutex<()>,
    _lock_file: File,
}

impl FileSnapshotStore {
    /// Opens or creates a store rooted at `root`.
    pub fn open(root: &Path, config: StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        fs::create_dir_all(root.join(ROLLING_DIR))?;
        fs::create_dir_all(root.join(HOURLY_DIR))?;
        fs::create_dir_all(root.join(STARTUP_DIR))?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(root.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::DirectoryLocked {
                path: root.display().to_string(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            config,
            io: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies the live document into the startup snapshot directory.
    ///
    /// Called once per process start; a missing or unreadable live file
    /// is simply skipped.
    pub fn write_startup_snapshot(&self) -> StoreResult<()> {
        let _guard = self.io.lock();
        let live = self.root.join(LIVE_FILE);
        if !live.exists() {
            return Ok(());
        }
        let name = format!("startup_{}.json", self.file_stamp());
        fs::copy(&live, self.root.join(STARTUP_DIR).join(name))?;
        let meta = self.read_meta();
        self.prune_dir(STARTUP_DIR, self.config.startup_keep, &meta);
        Ok(())
    }

    /// Reads a catalogued snapshot without installing it. Used by
    /// offline tooling (inspection, fee repair).
    pub fn read_restore_point(&self, id: &str) -> StoreResult<ScoreboardDocument> {
        let path = self.path_for(id)?;
        let raw = fs::read_to_string(&path)?;
        Ok(ScoreboardDocument::from_json_str(&raw)?)
    }

    fn file_stamp(&self) -> String {
        self.config
            .clock
            .now()
            .as_datetime()
            .format("%Y%m%dT%H%M%S%3f")
            .to_string()
    }

    fn live_path(&self) -> PathBuf {
        self.root.join(LIVE_FILE)
    }

    fn atomic_write(&self, path: &Path, payload: &str) -> StoreResult<()> {
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Reads a snapshot, returning `None` on any failure: malformed
    /// backups are skipped silently when scanning for candidates.
    fn read_snapshot(&self, path: &Path) -> Option<ScoreboardDocument> {
        let raw = fs::read_to_string(path).ok()?;
        match ScoreboardDocument::from_json_str(&raw) {
            Ok(doc) => Some(doc),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping malformed snapshot");
                None
            }
        }
    }

    fn read_meta(&self) -> MetaMap {
        let path = self.root.join(META_FILE);
        let Ok(raw) = fs::read_to_string(&path) else {
            return MetaMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    fn write_meta(&self, meta: &MetaMap) -> StoreResult<()> {
        let payload = serde_json::to_string_pretty(meta)?;
        self.atomic_write(&self.root.join(META_FILE), &payload)
    }

    /// Files in a subdirectory, newest first.
    fn dir_entries(&self, dir: &str) -> Vec<(PathBuf, SystemTime)> {
        let mut out = Vec::new();
        let Ok(entries) = fs::read_dir(self.root.join(dir)) else {
            return out;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((path, modified));
        }
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }

    /// Pre-restore safety copies living in the root directory.
    fn pre_restore_entries(&self) -> Vec<(PathBuf, SystemTime)> {
        let mut out = Vec::new();
        let Ok(entries) = fs::read_dir(&self.root) else {
            return out;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(PRE_RESTORE_PREFIX) || !name.ends_with(".json") {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((path, modified));
        }
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }

    fn id_for(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        if id.contains("..") || id.starts_with('/') || id.starts_with('\\') {
            return Err(StoreError::InvalidRestorePointId { id: id.to_string() });
        }
        let path = self.root.join(id);
        if !path.is_file() {
            return Err(StoreError::UnknownRestorePoint { id: id.to_string() });
        }
        Ok(path)
    }

    /// Removes unlocked files beyond `keep`, newest kept first. Locked
    /// files never count against the retention limit and are never
    /// removed.
    fn prune_dir(&self, dir: &str, keep: usize, meta: &MetaMap) {
        let mut unlocked_seen = 0usize;
        for (path, _) in self.dir_entries(dir) {
            let id = self.id_for(&path);
            if meta.get(&id).map(|m| m.locked).unwrap_or(false) {
                continue;
            }
            unlocked_seen += 1;
            if unlocked_seen > keep {
                if let Err(err) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), %err, "failed to prune backup");
                }
            }
        }
    }

    /// All backup candidates (rolling, hourly, startup, pre-restore),
    /// ranked by (logical clock, file mtime, student count) descending.
    fn ranked_backup_candidates(&self) -> Vec<(PathBuf, ScoreboardDocument)> {
        let mut candidates: Vec<(PathBuf, SystemTime, ScoreboardDocument)> = Vec::new();
        let all = self
            .dir_entries(ROLLING_DIR)
            .into_iter()
            .chain(self.dir_entries(HOURLY_DIR))
            .chain(self.dir_entries(STARTUP_DIR))
            .chain(self.pre_restore_entries());
        for (path, modified) in all {
            if let Some(doc) = self.read_snapshot(&path) {
                candidates.push((path, modified, doc));
            }
        }
        candidates.sort_by(|a, b| {
            let key_a = (a.2.server_updated_at, a.1, a.2.student_count());
            let key_b = (b.2.server_updated_at, b.1, b.2.student_count());
            key_b.cmp(&key_a)
        });
        candidates.into_iter().map(|(p, _, d)| (p, d)).collect()
    }

    fn catalog_entry(
        &self,
        path: &Path,
        kind: RestorePointKind,
        modified: SystemTime,
        meta: &MetaMap,
    ) -> RestorePoint {
        let id = self.id_for(path);
        let snapshot = self.read_snapshot(path);
        let entry_meta = meta.get(&id).cloned().unwrap_or_default();
        RestorePoint {
            id,
            kind,
            modified,
            updated_at: snapshot.as_ref().and_then(|d| d.server_updated_at),
            student_count: snapshot.map(|d| d.student_count()).unwrap_or(0),
            locked: entry_meta.locked,
            label: entry_meta.label,
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> StoreResult<Option<ScoreboardDocument>> {
        let live = self.live_path();
        if live.is_file() {
            if let Some(doc) = self.read_snapshot(&live) {
                return Ok(Some(doc));
            }
            tracing::warn!("live document unreadable, scanning backups");
        }
        // Missing or unreadable live file: recover from the best backup
        // rather than erroring.
        match self.ranked_backup_candidates().into_iter().next() {
            Some((path, doc)) => {
                tracing::info!(source = %path.display(), "recovered document from backup");
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn save(&self, document: &ScoreboardDocument) -> StoreResult<()> {
        let _guard = self.io.lock();
        let payload = serde_json::to_string_pretty(document)?;
        self.atomic_write(&self.live_path(), &payload)?;

        let meta = self.read_meta();

        // Rolling backup of what we just wrote.
        let rolling_name = format!("scoreboard_{}.json", self.file_stamp());
        let rolling_path = self.root.join(ROLLING_DIR).join(rolling_name);
        if let Err(err) = fs::copy(self.live_path(), &rolling_path) {
            tracing::warn!(%err, "failed to write rolling backup");
        }
        self.prune_dir(ROLLING_DIR, self.config.rolling_keep, &meta);

        // One immutable snapshot per clock-hour.
        let hour_key = self
            .config
            .clock
            .now()
            .as_datetime()
            .format("%Y%m%d%H")
            .to_string();
        let hourly_path = self
            .root
            .join(HOURLY_DIR)
            .join(format!("hourly_{hour_key}.json"));
        if !hourly_path.exists() {
            if let Err(err) = fs::copy(self.live_path(), &hourly_path) {
                tracing::warn!(%err, "failed to write hourly snapshot");
            }
            self.prune_dir(HOURLY_DIR, self.config.hourly_keep, &meta);
        }

        Ok(())
    }

    fn list_restore_points(&self) -> StoreResult<Vec<RestorePoint>> {
        let meta = self.read_meta();
        let mut points = Vec::new();

        let live = self.live_path();
        if live.is_file() {
            let modified = fs::metadata(&live)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            points.push(self.catalog_entry(&live, RestorePointKind::Live, modified, &meta));
        }
        for (path, modified) in self.dir_entries(ROLLING_DIR) {
            points.push(self.catalog_entry(&path, RestorePointKind::Rolling, modified, &meta));
        }
        for (path, modified) in self.dir_entries(HOURLY_DIR) {
            points.push(self.catalog_entry(&path, RestorePointKind::Hourly, modified, &meta));
        }
        for (path, modified) in self.dir_entries(STARTUP_DIR) {
            points.push(self.catalog_entry(&path, RestorePointKind::Startup, modified, &meta));
        }
        for (path, modified) in self.pre_restore_entries() {
            points.push(self.catalog_entry(&path, RestorePointKind::PreRestore, modified, &meta));
        }

        points.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(points)
    }

    fn restore(&self, id: &str) -> StoreResult<ScoreboardDocument> {
        let _guard = self.io.lock();
        let path = self.path_for(id)?;
        let raw = fs::read_to_string(&path)?;
        let mut document = ScoreboardDocument::from_json_str(&raw)?;

        // Safety copy of whatever is live right now.
        let live = self.live_path();
        if live.is_file() {
            let safety = self
                .root
                .join(format!("{}{}.json", PRE_RESTORE_PREFIX, self.file_stamp()));
            fs::copy(&live, &safety)?;
        }

        document.touch(self.config.clock.now());
        let payload = serde_json::to_string_pretty(&document)?;
        self.atomic_write(&live, &payload)?;
        tracing::info!(%id, "restored snapshot as live document");
        Ok(document)
    }

    fn set_restore_meta(
        &self,
        id: &str,
        locked: Option<bool>,
        label: Option<String>,
    ) -> StoreResult<()> {
        let _guard = self.io.lock();
        self.path_for(id)?;
        let mut meta = self.read_meta();
        let entry = meta.entry(id.to_string()).or_default();
        if let Some(locked) = locked {
            entry.locked = locked;
        }
        if let Some(label) = label {
            entry.label = label;
        }
        self.write_meta(&meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classboard_model::Timestamp;
    use tempfile::TempDir;

    fn document(count: usize, clock: &str) -> ScoreboardDocument {
        let mut doc = ScoreboardDocument::default();
        doc.server_updated_at = Some(Timestamp::parse(clock).unwrap());
        for i in 0..count {
            doc.students.push(classboard_model::Student {
                id: i as i64 + 1,
                roll: format!("EA24A{:02}", i + 1),
                name: format!("Student {}", i + 1),
                base_name: format!("Student {}", i + 1),
                class: 4,
                group: "A".into(),
                fees: 500,
                vote_power: 1,
                stars: 0,
                vetos: 0,
                active: true,
                created_at: None,
                updated_at: None,
            });
        }
        doc
    }

    fn open(dir: &TempDir) -> FileSnapshotStore {
        FileSnapshotStore::open(dir.path(), StoreConfig::default()).unwrap()
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let doc = document(3, "2026-02-03T10:00:00+05:30");
        store.save(&doc).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.student_count(), 3);
        assert_eq!(loaded.server_updated_at, doc.server_updated_at);
    }

    #[test]
    fn empty_store_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_live_file_recovers_from_backup() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.save(&document(5, "2026-02-03T10:00:00+05:30")).unwrap();
        // Clobber the live file; the rolling backup still has the data.
        fs::write(dir.path().join(LIVE_FILE), "{ not json").unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.student_count(), 5);
    }

    #[test]
    fn missing_live_file_recovers_from_backup() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.save(&document(4, "2026-02-03T10:00:00+05:30")).unwrap();
        fs::remove_file(dir.path().join(LIVE_FILE)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.student_count(), 4);
    }

    #[test]
    fn rolling_backups_are_pruned() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::default().with_rolling_keep(2);
        let store = FileSnapshotStore::open(dir.path(), config).unwrap();
        for i in 0..5 {
            store
                .save(&document(3 + i, "2026-02-03T10:00:00+05:30"))
                .unwrap();
        }
        let rolling = store.dir_entries(ROLLING_DIR);
        assert!(rolling.len() <= 2, "kept {} rolling backups", rolling.len());
    }

    #[test]
    fn locked_backups_survive_pruning() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::default().with_rolling_keep(1);
        let store = FileSnapshotStore::open(dir.path(), config).unwrap();
        store.save(&document(3, "2026-02-03T10:00:00+05:30")).unwrap();

        let first = store
            .list_restore_points()
            .unwrap()
            .into_iter()
            .find(|p| p.kind == RestorePointKind::Rolling)
            .unwrap();
        store
            .set_restore_meta(&first.id, Some(true), Some("before exam week".into()))
            .unwrap();

        for i in 0..4 {
            store
                .save(&document(4 + i, "2026-02-03T10:00:00+05:30"))
                .unwrap();
        }

        let points = store.list_restore_points().unwrap();
        let locked = points.iter().find(|p| p.id == first.id).unwrap();
        assert!(locked.locked);
        assert_eq!(locked.label, "before exam week");
    }

    #[test]
    fn restore_writes_pre_restore_safety_copy() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.save(&document(3, "2026-02-01T10:00:00+05:30")).unwrap();
        let snapshot_id = store
            .list_restore_points()
            .unwrap()
            .into_iter()
            .find(|p| p.kind == RestorePointKind::Rolling)
            .unwrap()
            .id;

        store.save(&document(7, "2026-02-03T10:00:00+05:30")).unwrap();
        let restored = store.restore(&snapshot_id).unwrap();
        assert_eq!(restored.student_count(), 3);
        // Restore bumps the logical clock: the snapshot's own stamp is gone.
        let original = Timestamp::parse("2026-02-01T10:00:00+05:30").unwrap();
        assert_ne!(restored.server_updated_at, Some(original));

        let points = store.list_restore_points().unwrap();
        assert!(points.iter().any(|p| p.kind == RestorePointKind::PreRestore));
        // And the pre-restore copy holds the 7-student document.
        let pre = points
            .iter()
            .find(|p| p.kind == RestorePointKind::PreRestore)
            .unwrap();
        assert_eq!(pre.student_count, 7);
    }

    #[test]
    fn restore_rejects_path_escape() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let err = store.restore("../etc/passwd").unwrap_err();
        assert!(matches!(err, StoreError::InvalidRestorePointId { .. }));
    }

    #[test]
    fn unknown_restore_point_errors() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let err = store.restore("offline_scoreboard_backups/ghost.json").unwrap_err();
        assert!(matches!(err, StoreError::UnknownRestorePoint { .. }));
    }

    #[test]
    fn startup_snapshot_is_written_once_per_boot() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.save(&document(3, "2026-02-03T10:00:00+05:30")).unwrap();
        store.write_startup_snapshot().unwrap();
        let points = store.list_restore_points().unwrap();
        assert!(points.iter().any(|p| p.kind == RestorePointKind::Startup));
    }

    #[test]
    fn second_open_of_same_directory_is_refused() {
        let dir = TempDir::new().unwrap();
        let _store = open(&dir);
        let second = FileSnapshotStore::open(dir.path(), StoreConfig::default());
        assert!(matches!(second, Err(StoreError::DirectoryLocked { .. })));
    }
}
