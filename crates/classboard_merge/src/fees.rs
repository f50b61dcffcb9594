//! Fee record merge: payment evidence is never discarded.

use crate::tiebreak::{pick_newer, Side};
use classboard_model::{FeePayment, FeeRecord, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// Merges fee records keyed by student id.
///
/// Specialized rules, applied regardless of which side is "newer":
/// - `payment_history` is deduplicated by `(date, amount, note)` and
///   unioned, never replaced
/// - `last_paid_date` is the lexicographic maximum of both sides
///
/// Only the advisory `remarks` field follows normal newest-wins.
pub fn merge_fee_records(
    existing: &[FeeRecord],
    incoming: &[FeeRecord],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<FeeRecord> {
    let mut by_student: BTreeMap<i64, FeeRecord> = existing
        .iter()
        .map(|f| (f.student_id, f.clone()))
        .collect();

    for candidate in incoming {
        match by_student.get_mut(&candidate.student_id) {
            None => {
                let mut fresh = candidate.clone();
                fresh.normalize();
                by_student.insert(candidate.student_id, fresh);
            }
            Some(current) => {
                let history = union_history(&current.payment_history, &candidate.payment_history);
                let last_paid = max_date(
                    current.last_paid_date.as_deref(),
                    candidate.last_paid_date.as_deref(),
                );

                let winner = pick_newer(
                    current.updated_at.or(existing_clock),
                    current.student_id,
                    candidate.updated_at.or(incoming_clock),
                    candidate.student_id,
                );
                if winner == Side::Incoming {
                    current.remarks = candidate.remarks.clone();
                    current.updated_at = candidate.updated_at.or(current.updated_at);
                }
                current.payment_history = history;
                current.last_paid_date = last_paid;
            }
        }
    }

    by_student.into_values().collect()
}

fn union_history(a: &[FeePayment], b: &[FeePayment]) -> Vec<FeePayment> {
    let mut seen = BTreeSet::new();
    let mut out: Vec<FeePayment> = Vec::with_capacity(a.len() + b.len());
    for payment in a.iter().chain(b) {
        if seen.insert(payment.fingerprint()) {
            out.push(payment.clone());
        }
    }
    out.sort_by_key(|p| p.fingerprint());
    out
}

fn max_date(a: Option<&str>, b: Option<&str>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a >= b { a.to_string() } else { b.to_string() }),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    }
}
