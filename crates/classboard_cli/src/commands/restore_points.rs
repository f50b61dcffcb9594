//! Restore-point listing command.

use super::open_store;
use classboard_store::SnapshotStore;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Prints the restore-point catalog, newest first.
pub fn run(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let points = store.list_restore_points()?;
    if points.is_empty() {
        println!("No restore points in {:?}", data_dir);
        return Ok(());
    }

    for point in points {
        let age_secs = point
            .modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let clock = point
            .updated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".into());
        let lock = if point.locked { " [locked]" } else { "" };
        let label = if point.label.is_empty() {
            String::new()
        } else {
            format!("  \"{}\"", point.label)
        };
        println!(
            "{:<11} {:>3} students  clock {}  mtime {}{}{}",
            format!("{:?}", point.kind).to_lowercase(),
            point.student_count,
            clock,
            age_secs,
            lock,
            label
        );
        println!("    id: {}", point.id);
    }
    Ok(())
}
