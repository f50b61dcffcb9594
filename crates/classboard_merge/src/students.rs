//! Student roster merge.

use crate::tiebreak::{pick_newer, Side};
use classboard_model::{Student, Timestamp};
use std::collections::BTreeMap;

/// Merges two student rosters keyed by roll.
///
/// Specialized rule: a transition `active:true -> active:false` is only
/// accepted when the incoming record's timestamp is strictly newer than
/// the existing one; on a tie (or when either timestamp is unknown) the
/// existing `active` value is kept. This protects against a stale device
/// pushing an outdated deactivation.
///
/// The surviving record always keeps the *existing* local id: numeric ids
/// are local-only and must never be overwritten by a peer's numbering.
pub fn merge_students(
    existing: &[Student],
    incoming: &[Student],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<Student> {
    let mut by_roll: BTreeMap<String, Student> = existing
        .iter()
        .map(|s| (s.roll.clone(), s.clone()))
        .collect();

    for candidate in incoming {
        match by_roll.get_mut(&candidate.roll) {
            None => {
                by_roll.insert(candidate.roll.clone(), candidate.clone());
            }
            Some(current) => {
                let current_ts = current.merge_timestamp().or(existing_clock);
                let candidate_ts = candidate.merge_timestamp().or(incoming_clock);
                let winner = pick_newer(current_ts, current.id, candidate_ts, candidate.id);
                if winner == Side::Incoming {
                    let mut merged = candidate.clone();
                    merged.id = current.id;
                    if current.active && !candidate.active {
                        let strictly_newer = match (current_ts, candidate_ts) {
                            (Some(a), Some(b)) => b > a,
                            _ => false,
                        };
                        if !strictly_newer {
                            tracing::debug!(
                                roll = %current.roll,
                                "ignoring stale deactivation for student"
                            );
                            merged.active = true;
                        }
                    }
                    *current = merged;
                }
            }
        }
    }

    by_roll.into_values().collect()
}
