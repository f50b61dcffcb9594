//! Restore command.

use super::open_store;
use classboard_store::SnapshotStore;
use std::path::Path;
use tracing::info;

/// Installs a restore point as the live document. A pre-restore safety
/// copy of the current live document is written first.
pub fn run(data_dir: &Path, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let document = store.restore(id)?;
    info!(id, "restore complete");

    println!("✓ Restored {id}");
    println!("  Students: {}", document.student_count());
    if let Some(clock) = document.server_updated_at {
        println!("  New clock: {clock}");
    }
    Ok(())
}
