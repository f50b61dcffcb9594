//! Score row merge.

use crate::tiebreak::{pick_newer, Side};
use chrono::NaiveDate;
use classboard_model::{ScoreRecord, Timestamp};
use std::collections::BTreeMap;

/// Merges score rows keyed by `(student_id, date)`.
///
/// Missing timestamps are backfilled from `created_at` or the owning
/// document's clock before comparison, never left absent, since an absent
/// timestamp would otherwise always lose. On an exact timestamp tie the
/// row with the higher id wins.
pub fn merge_scores(
    existing: &[ScoreRecord],
    incoming: &[ScoreRecord],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<ScoreRecord> {
    let mut by_key: BTreeMap<(i64, NaiveDate), ScoreRecord> = existing
        .iter()
        .map(|s| (s.key(), s.clone()))
        .collect();

    for candidate in incoming {
        match by_key.get_mut(&candidate.key()) {
            None => {
                by_key.insert(candidate.key(), candidate.clone());
            }
            Some(current) => {
                let winner = pick_newer(
                    current.merge_timestamp(existing_clock),
                    current.id,
                    candidate.merge_timestamp(incoming_clock),
                    candidate.id,
                );
                if winner == Side::Incoming {
                    *current = candidate.clone();
                }
            }
        }
    }

    by_key.into_values().collect()
}
