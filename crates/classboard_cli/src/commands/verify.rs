//! Verify command: corruption checks for a data directory.

use super::open_store;
use classboard_store::SnapshotStore;
use classboard_sync::{CorruptionGuard, GuardConfig};
use std::path::Path;

/// Runs the tiny-roster check on the live document and reports how many
/// healthy recovery candidates the catalog holds.
pub fn run(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let guard = CorruptionGuard::new(GuardConfig::default());

    let points = store.list_restore_points()?;
    let healthy_candidates = points
        .iter()
        .filter(|p| p.student_count >= guard.config().min_roster)
        .count();

    match store.load()? {
        None => {
            println!("No document in {:?}", data_dir);
            println!("  Restore points: {} ({} healthy)", points.len(), healthy_candidates);
        }
        Some(document) => {
            if guard.is_implausible(&document) {
                println!(
                    "✗ CORRUPT: {} students is below the minimum of {}",
                    document.student_count(),
                    guard.config().min_roster
                );
                println!(
                    "  {} healthy restore points available for recovery",
                    healthy_candidates
                );
                return Err("document fails the tiny-roster check".into());
            }
            println!("✓ Document passes the tiny-roster check");
            println!("  Students: {}", document.student_count());
            println!("  Restore points: {} ({} healthy)", points.len(), healthy_candidates);
        }
    }
    Ok(())
}
