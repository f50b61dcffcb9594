//! Document-level merge.

use crate::{
    merge_appeals, merge_attendance, merge_cabinet_items, merge_class_reps, merge_deductions,
    merge_fee_records, merge_group_crs, merge_leadership, merge_month_rosters, merge_parties,
    merge_pending_results, merge_requests, merge_scores, merge_students, merge_transactions,
    merge_votes, recompute_veto_ledger,
};
use classboard_model::{Notification, ScoreboardDocument, SyllabusEntry, Timestamp};
use std::collections::BTreeMap;

/// Merges two whole documents collection by collection.
///
/// The result carries `now` as its new logical clock and a freshly
/// recomputed veto ledger. Applying peer A's document then peer B's, or
/// B's then A's, converges to the same collections because every
/// per-collection rule is a deterministic function of item timestamps,
/// not argument order.
pub fn merge_documents(
    existing: &ScoreboardDocument,
    incoming: &ScoreboardDocument,
    now: Timestamp,
) -> ScoreboardDocument {
    let ec = existing.server_updated_at;
    let ic = incoming.server_updated_at;

    let mut merged = ScoreboardDocument {
        server_updated_at: Some(now),
        students: merge_students(&existing.students, &incoming.students, ec, ic),
        scores: merge_scores(&existing.scores, &incoming.scores, ec, ic),
        attendance: merge_attendance(
            &existing.attendance,
            &incoming.attendance,
            &existing.students,
            &incoming.students,
            ec,
            ic,
        ),
        fee_records: merge_fee_records(&existing.fee_records, &incoming.fee_records, ec, ic),
        cabinet_items: merge_cabinet_items(&existing.cabinet_items, &incoming.cabinet_items, ec, ic),
        resource_requests: merge_requests(
            &existing.resource_requests,
            &incoming.resource_requests,
            ec,
            ic,
        ),
        resource_transactions: merge_transactions(
            &existing.resource_transactions,
            &incoming.resource_transactions,
            ec,
            ic,
        ),
        advantage_deductions: merge_deductions(
            &existing.advantage_deductions,
            &incoming.advantage_deductions,
            ec,
            ic,
        ),
        leadership: merge_leadership(&existing.leadership, &incoming.leadership, ec, ic),
        class_reps: merge_class_reps(&existing.class_reps, &incoming.class_reps, ec, ic),
        group_crs: merge_group_crs(&existing.group_crs, &incoming.group_crs, ec, ic),
        parties: merge_parties(&existing.parties, &incoming.parties, ec, ic),
        election_votes: merge_votes(&existing.election_votes, &incoming.election_votes, ec, ic),
        pending_results: merge_pending_results(
            &existing.pending_results,
            &incoming.pending_results,
            ec,
            ic,
        ),
        appeals: merge_appeals(&existing.appeals, &incoming.appeals, ec, ic),
        notifications: merge_notifications(&existing.notifications, &incoming.notifications, ec, ic),
        syllabus: merge_syllabus(&existing.syllabus, &incoming.syllabus, ec, ic),
        month_rosters: merge_month_rosters(&existing.month_rosters, &incoming.month_rosters),
        role_veto_monthly: BTreeMap::new(),
    };

    // Every merged roll is known for the merged month.
    let rolls = merged.roll_set();
    merged
        .month_rosters
        .entry(now.month_key())
        .or_default()
        .extend(rolls);

    recompute_veto_ledger(&mut merged);
    merged
}

fn merge_notifications(
    existing: &[Notification],
    incoming: &[Notification],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<Notification> {
    let mut by_id: BTreeMap<i64, Notification> =
        existing.iter().map(|n| (n.id, n.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let winner = crate::pick_newer(
                    current.merge_timestamp(existing_clock),
                    current.id,
                    candidate.merge_timestamp(incoming_clock),
                    candidate.id,
                );
                if winner == crate::Side::Incoming {
                    *current = candidate.clone();
                }
            }
        }
    }
    by_id.into_values().collect()
}

fn merge_syllabus(
    existing: &[SyllabusEntry],
    incoming: &[SyllabusEntry],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<SyllabusEntry> {
    let mut by_id: BTreeMap<i64, SyllabusEntry> =
        existing.iter().map(|e| (e.id, e.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let winner = crate::pick_newer(
                    current.merge_timestamp(existing_clock),
                    current.id,
                    candidate.merge_timestamp(incoming_clock),
                    candidate.id,
                );
                if winner == crate::Side::Incoming {
                    *current = candidate.clone();
                }
            }
        }
    }
    by_id.into_values().collect()
}
