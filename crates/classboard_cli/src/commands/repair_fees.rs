//! Fee repair command.
//!
//! Payments are evidence; if the live document ever lost some (a bad
//! restore, a partial sync), every backup still holding them can prove
//! they happened. This pass unions `payment_history` for every student
//! across the live document and every readable restore point, takes the
//! maximum `last_paid_date`, and writes the result back.

use super::open_store;
use classboard_merge::merge_fee_records;
use classboard_store::SnapshotStore;
use std::path::Path;
use tracing::{debug, info};

/// Rebuilds best-known payment evidence from all snapshots.
pub fn run(data_dir: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let Some(mut live) = store.load()? else {
        return Err(format!("no document in {data_dir:?}").into());
    };

    let before: usize = live
        .fee_records
        .iter()
        .map(|f| f.payment_history.len())
        .sum();

    let mut repaired = live.fee_records.clone();
    for point in store.list_restore_points()? {
        let Ok(snapshot) = store.read_restore_point(&point.id) else {
            debug!(id = %point.id, "skipping unreadable snapshot");
            continue;
        };
        if snapshot.fee_records.is_empty() {
            continue;
        }
        repaired = merge_fee_records(&repaired, &snapshot.fee_records, None, None);
    }

    let after: usize = repaired.iter().map(|f| f.payment_history.len()).sum();
    let recovered = after.saturating_sub(before);

    if dry_run {
        println!("Would recover {recovered} payment entries ({before} -> {after})");
        return Ok(());
    }

    live.fee_records = repaired;
    store.save(&live)?;
    info!(recovered, "fee repair complete");
    println!("✓ Recovered {recovered} payment entries ({before} -> {after})");
    Ok(())
}
