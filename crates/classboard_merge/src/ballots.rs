//! Election vote, pending result and appeal merges.

use crate::tiebreak::{pick_newer, Side};
use classboard_model::{Appeal, AppealStatus, ElectionVote, PendingResult, Timestamp};
use std::collections::BTreeMap;

/// Merges ballots keyed by `(voter_roll, post_id)`.
///
/// Duplicate voter+post pairs across peers resolve last-write-wins by
/// `cast_at`, id as the tie-break. Within one document duplicates were
/// already rejected at the validation boundary.
pub fn merge_votes(
    existing: &[ElectionVote],
    incoming: &[ElectionVote],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<ElectionVote> {
    let mut by_key: BTreeMap<(String, i64), ElectionVote> = existing
        .iter()
        .map(|v| (v.key(), v.clone()))
        .collect();
    for candidate in incoming {
        match by_key.get_mut(&candidate.key()) {
            None => {
                by_key.insert(candidate.key(), candidate.clone());
            }
            Some(current) => {
                let winner = pick_newer(
                    current.cast_at.or(existing_clock),
                    current.id,
                    candidate.cast_at.or(incoming_clock),
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

/// Merges pending election results keyed by id. `applied` is a latch: a
/// result applied anywhere stays applied.
pub fn merge_pending_results(
    existing: &[PendingResult],
    incoming: &[PendingResult],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<PendingResult> {
    let mut by_id: BTreeMap<i64, PendingResult> =
        existing.iter().map(|r| (r.id, r.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let applied = current.applied || candidate.applied;
                let winner = pick_newer(
                    current.declared_at.or(existing_clock),
                    current.id,
                    candidate.declared_at.or(incoming_clock),
                    candidate.id,
                );
                if winner == Side::Incoming {
                    *current = candidate.clone();
                }
                current.applied = applied;
            }
        }
    }
    by_id.into_values().collect()
}

/// Merges appeals keyed by id.
///
/// A decided appeal (accepted or declined) never regresses to open from
/// a stale write; two decisions resolve by the default tie-break.
pub fn merge_appeals(
    existing: &[Appeal],
    incoming: &[Appeal],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<Appeal> {
    let mut by_id: BTreeMap<i64, Appeal> = existing.iter().map(|a| (a.id, a.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let current_decided = current.status != AppealStatus::Open;
                let candidate_decided = candidate.status != AppealStatus::Open;
                if current_decided && !candidate_decided {
                    continue;
                }
                if candidate_decided && !current_decided {
                    *current = candidate.clone();
                    continue;
                }
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
    by_id.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn vote(id: i64, roll: &str, post_id: i64, candidate: &str, cast: Option<&str>) -> ElectionVote {
        ElectionVote {
            id,
            voter_roll: roll.into(),
            post_id,
            candidate: candidate.into(),
            cast_at: cast.map(|c| ts(c)),
        }
    }

    #[test]
    fn duplicate_voter_post_resolves_by_cast_time() {
        let a = vote(1, "EA25B06", 1, "X", Some("2026-02-02T10:00:00+05:30"));
        let b = vote(2, "EA25B06", 1, "Y", Some("2026-02-02T10:00:05+05:30"));
        let merged = merge_votes(&[a], &[b], None, None);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].candidate, "Y");
    }

    #[test]
    fn distinct_voters_both_survive() {
        let a = vote(1, "EA25B06", 1, "X", None);
        let b = vote(2, "EA25B10", 1, "X", None);
        let merged = merge_votes(&[a], &[b], None, None);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn applied_result_stays_applied() {
        let applied = PendingResult {
            id: 1,
            post_id: 1,
            winner: "JAY".into(),
            applied: true,
            declared_at: Some(ts("2026-02-02T10:00:00+05:30")),
        };
        let mut stale = applied.clone();
        stale.applied = false;
        stale.declared_at = Some(ts("2026-02-03T10:00:00+05:30"));

        let merged = merge_pending_results(&[applied], &[stale], None, None);
        assert!(merged[0].applied);
    }

    #[test]
    fn decided_appeal_beats_stale_open() {
        let decided = Appeal {
            id: 1,
            roll: "EA24A01".into(),
            month: "2026-02".into(),
            author: "teacher1".into(),
            message: "recount".into(),
            field_changes: Default::default(),
            status: AppealStatus::Accepted,
            created_at: None,
            updated_at: Some(ts("2026-02-02T10:00:00+05:30")),
        };
        let mut reopened = decided.clone();
        reopened.status = AppealStatus::Open;
        reopened.updated_at = Some(ts("2026-02-05T10:00:00+05:30"));

        let ab = merge_appeals(&[decided.clone()], &[reopened.clone()], None, None);
        let ba = merge_appeals(&[reopened], &[decided], None, None);
        assert_eq!(ab[0].status, AppealStatus::Accepted);
        assert_eq!(ba[0].status, AppealStatus::Accepted);
    }
}
