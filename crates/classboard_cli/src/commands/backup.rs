//! Backup export command.

use super::open_store;
use classboard_store::SnapshotStore;
use std::fs;
use std::path::Path;
use tracing::info;

/// Exports the current document to a standalone file.
pub fn run(data_dir: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let Some(document) = store.load()? else {
        return Err(format!("no document in {data_dir:?}").into());
    };

    let payload = serde_json::to_string_pretty(&document)?;
    fs::write(output, payload)?;
    info!(?output, "exported document");

    println!("✓ Backup written");
    println!("  Path: {:?}", output);
    println!("  Students: {}", document.student_count());
    if let Some(clock) = document.server_updated_at {
        println!("  Clock: {clock}");
    }
    Ok(())
}
