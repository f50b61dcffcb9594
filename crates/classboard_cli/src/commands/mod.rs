//! CLI command implementations.

pub mod backup;
pub mod inspect;
pub mod repair_fees;
pub mod restore;
pub mod restore_points;
pub mod verify;

use classboard_store::{FileSnapshotStore, StoreConfig};
use std::path::Path;

/// Opens the data directory the way every command does.
pub(crate) fn open_store(data_dir: &Path) -> Result<FileSnapshotStore, Box<dyn std::error::Error>> {
    Ok(FileSnapshotStore::open(data_dir, StoreConfig::default())?)
}
