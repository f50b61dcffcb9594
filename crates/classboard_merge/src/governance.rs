//! Leadership, class-rep, group-CR and party merges.

use crate::tiebreak::{pick_newer, Side};
use classboard_model::{
    normalize_name_key, ClassRep, GroupCr, LeadershipPost, Party, PostStatus, Timestamp,
};
use std::collections::BTreeMap;

/// Merges leadership posts keyed by id.
///
/// Specialized rules:
/// - a populated entry is never replaced by an empty one from a stale
///   write
/// - an `ended` status is sticky against a stale `active` status for the
///   *same* assignee
/// - a *different* assignee in the incoming record is an intentional
///   reassignment and is accepted under the default tie-break
pub fn merge_leadership(
    existing: &[LeadershipPost],
    incoming: &[LeadershipPost],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<LeadershipPost> {
    let mut by_id: BTreeMap<i64, LeadershipPost> =
        existing.iter().map(|p| (p.id, p.clone())).collect();

    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let current_ts = current.updated_at.or(existing_clock);
                let candidate_ts = candidate.updated_at.or(incoming_clock);
                let strictly_newer = match (current_ts, candidate_ts) {
                    (Some(a), Some(b)) => b > a,
                    (None, Some(_)) => true,
                    _ => false,
                };

                if current.is_populated() && !candidate.is_populated() {
                    // Vacating an office needs a strictly newer write.
                    if strictly_newer {
                        *current = candidate.clone();
                    } else {
                        tracing::debug!(post = %current.post, "ignoring stale vacancy");
                    }
                    continue;
                }

                let same_assignee =
                    normalize_name_key(&current.holder) == normalize_name_key(&candidate.holder);
                if same_assignee
                    && current.status == PostStatus::Ended
                    && candidate.status == PostStatus::Active
                    && !strictly_newer
                {
                    tracing::debug!(post = %current.post, "ended tenure is sticky");
                    continue;
                }

                // A different assignee is an intentional reassignment: the
                // stickiness rules above do not apply, only the default
                // tie-break decides.
                let winner = pick_newer(current_ts, current.id, candidate_ts, candidate.id);
                if winner == Side::Incoming {
                    *current = candidate.clone();
                }
            }
        }
    }

    by_id.into_values().collect()
}

/// Merges class reps keyed by class, with holder stickiness on `roll`.
pub fn merge_class_reps(
    existing: &[ClassRep],
    incoming: &[ClassRep],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<ClassRep> {
    let mut by_class: BTreeMap<i64, ClassRep> =
        existing.iter().map(|r| (r.class, r.clone())).collect();
    for candidate in incoming {
        match by_class.get_mut(&candidate.class) {
            None => {
                by_class.insert(candidate.class, candidate.clone());
            }
            Some(current) => {
                if merge_office(
                    &current.roll,
                    current.updated_at.or(existing_clock),
                    current.class,
                    &candidate.roll,
                    candidate.updated_at.or(incoming_clock),
                    candidate.class,
                ) {
                    *current = candidate.clone();
                }
            }
        }
    }
    by_class.into_values().collect()
}

/// Merges group CRs keyed by group letter, with holder stickiness.
pub fn merge_group_crs(
    existing: &[GroupCr],
    incoming: &[GroupCr],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<GroupCr> {
    let mut by_group: BTreeMap<String, GroupCr> = existing
        .iter()
        .map(|r| (r.group.clone(), r.clone()))
        .collect();
    for candidate in incoming {
        match by_group.get_mut(&candidate.group) {
            None => {
                by_group.insert(candidate.group.clone(), candidate.clone());
            }
            Some(current) => {
                if merge_office(
                    &current.roll,
                    current.updated_at.or(existing_clock),
                    0,
                    &candidate.roll,
                    candidate.updated_at.or(incoming_clock),
                    0,
                ) {
                    *current = candidate.clone();
                }
            }
        }
    }
    by_group.into_values().collect()
}

/// Shared office rule: populated never loses to empty without a strictly
/// newer write; otherwise the default tie-break decides.
fn merge_office(
    current_holder: &str,
    current_ts: Option<Timestamp>,
    current_seq: i64,
    candidate_holder: &str,
    candidate_ts: Option<Timestamp>,
    candidate_seq: i64,
) -> bool {
    let strictly_newer = match (current_ts, candidate_ts) {
        (Some(a), Some(b)) => b > a,
        (None, Some(_)) => true,
        _ => false,
    };
    if !current_holder.is_empty() && candidate_holder.is_empty() && !strictly_newer {
        return false;
    }
    pick_newer(current_ts, current_seq, candidate_ts, candidate_seq) == Side::Incoming
}

/// Merges parties keyed by id with the default tie-break.
pub fn merge_parties(
    existing: &[Party],
    incoming: &[Party],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<Party> {
    let mut by_id: BTreeMap<i64, Party> = existing.iter().map(|p| (p.id, p.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let winner = pick_newer(
                    current.updated_at.or(existing_clock),
                    current.id,
                    candidate.updated_at.or(incoming_clock),
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

    fn post(id: i64, holder: &str, status: PostStatus, updated: Option<&str>) -> LeadershipPost {
        LeadershipPost {
            id,
            post: "LEADER (L)".into(),
            holder: holder.into(),
            status,
            veto_quota: 5,
            tenure_months: 2,
            since_month: Some("2026-02".into()),
            updated_at: updated.map(|u| ts(u)),
        }
    }

    #[test]
    fn populated_never_loses_to_stale_empty() {
        let held = post(1, "HARSH MALLICK", PostStatus::Active, Some("2026-02-02T10:00:00+05:30"));
        let empty = post(1, "", PostStatus::Vacant, Some("2026-02-01T10:00:00+05:30"));
        let merged = merge_leadership(&[held], &[empty], None, None);
        assert_eq!(merged[0].holder, "HARSH MALLICK");
    }

    #[test]
    fn strictly_newer_vacancy_is_accepted() {
        let held = post(1, "HARSH MALLICK", PostStatus::Active, Some("2026-02-02T10:00:00+05:30"));
        let vacated = post(1, "", PostStatus::Vacant, Some("2026-02-03T10:00:00+05:30"));
        let merged = merge_leadership(&[held], &[vacated], None, None);
        assert!(merged[0].holder.is_empty());
    }

    #[test]
    fn ended_is_sticky_for_same_assignee() {
        let ended = post(1, "Harsh Mallik", PostStatus::Ended, Some("2026-02-02T10:00:00+05:30"));
        let stale_active = post(1, "HARSH MALLIK***", PostStatus::Active, Some("2026-02-02T10:00:00+05:30"));
        let merged = merge_leadership(&[ended], &[stale_active], None, None);
        assert_eq!(merged[0].status, PostStatus::Ended);
    }

    #[test]
    fn different_assignee_is_a_reassignment() {
        // Ended is sticky for the same assignee, but a newer write naming a
        // different holder is an intentional reassignment and goes through.
        let ended = post(1, "HARSH MALLICK", PostStatus::Ended, Some("2026-02-02T10:00:00+05:30"));
        let reassigned = post(1, "REEYANSH LAMA", PostStatus::Active, Some("2026-02-03T09:00:00+05:30"));
        let merged = merge_leadership(&[ended], &[reassigned], None, None);
        assert_eq!(merged[0].holder, "REEYANSH LAMA");
        assert_eq!(merged[0].status, PostStatus::Active);
    }

    #[test]
    fn class_rep_holder_stickiness() {
        let held = ClassRep {
            class: 9,
            roll: "EA25D20".into(),
            status: PostStatus::Active,
            updated_at: Some(ts("2026-02-02T10:00:00+05:30")),
        };
        let stale_empty = ClassRep {
            class: 9,
            roll: String::new(),
            status: PostStatus::Vacant,
            updated_at: Some(ts("2026-02-01T10:00:00+05:30")),
        };
        let merged = merge_class_reps(&[held], &[stale_empty], None, None);
        assert_eq!(merged[0].roll, "EA25D20");
    }

    #[test]
    fn merge_is_idempotent() {
        let a = vec![post(1, "HARSH MALLICK", PostStatus::Active, Some("2026-02-02T10:00:00+05:30"))];
        let b = vec![post(1, "REEYANSH LAMA", PostStatus::Active, Some("2026-02-03T10:00:00+05:30"))];
        let once = merge_leadership(&a, &b, None, None);
        let twice = merge_leadership(&once, &b, None, None);
        assert_eq!(once, twice);
    }
}
