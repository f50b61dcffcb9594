//! Inspect command: document statistics and monthly standings.

use super::open_store;
use classboard_model::ClockConfig;
use classboard_store::SnapshotStore;
use std::path::Path;

/// Prints document statistics and the monthly summary.
pub fn run(
    data_dir: &Path,
    month: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let Some(document) = store.load()? else {
        println!("No document in {:?}", data_dir);
        return Ok(());
    };

    let month = month
        .map(str::to_string)
        .unwrap_or_else(|| ClockConfig::default().current_month());
    let summary = document.monthly_summary(&month);

    if format == "json" {
        let value = serde_json::json!({
            "updated_at": document.server_updated_at,
            "students": document.student_count(),
            "active_students": document.active_student_count(),
            "collections": document.collection_sizes(),
            "month": month,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Document in {:?}", data_dir);
    match document.server_updated_at {
        Some(clock) => println!("  Updated: {clock}"),
        None => println!("  Updated: (no clock)"),
    }
    println!(
        "  Students: {} ({} active)",
        document.student_count(),
        document.active_student_count()
    );
    for (name, size) in document.collection_sizes() {
        if size > 0 {
            println!("  {name}: {size}");
        }
    }

    println!("Standings for {month}:");
    for (rank, row) in summary.iter().enumerate().take(10) {
        println!(
            "  {:>2}. {:<10} {:>5} pts {:>3}* {:>3}v net {:>5}",
            rank + 1,
            row.roll,
            row.points,
            row.stars,
            row.vetos,
            row.net_score
        );
    }
    if summary.is_empty() {
        println!("  (no scores recorded)");
    }
    Ok(())
}
