//! Resource cabinet, request, transaction and deduction merges.

use crate::tiebreak::{pick_newer, Side};
use classboard_model::{
    AdvantageDeduction, CabinetItem, ResourceRequest, ResourceTransaction, Timestamp,
};
use std::collections::BTreeMap;

/// Merges cabinet catalog items keyed by id with the default tie-break.
pub fn merge_cabinet_items(
    existing: &[CabinetItem],
    incoming: &[CabinetItem],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<CabinetItem> {
    let mut by_id: BTreeMap<i64, CabinetItem> =
        existing.iter().map(|i| (i.id, i.clone())).collect();
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

/// Merges resource requests keyed by id.
///
/// Specialized rule: status may only advance along the state machine. A
/// merge that would regress status is resolved in favor of the
/// more-advanced side, even when the less-advanced side carries a newer
/// timestamp: administrative decisions are not rolled back by
/// replication races. Equal-rank conflicts fall back to the default
/// tie-break.
pub fn merge_requests(
    existing: &[ResourceRequest],
    incoming: &[ResourceRequest],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<ResourceRequest> {
    let mut by_id: BTreeMap<i64, ResourceRequest> =
        existing.iter().map(|r| (r.id, r.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let current_rank = current.status.rank();
                let candidate_rank = candidate.status.rank();
                if candidate_rank > current_rank {
                    *current = candidate.clone();
                } else if candidate_rank == current_rank {
                    let winner = pick_newer(
                        current.merge_timestamp(existing_clock),
                        current.id,
                        candidate.merge_timestamp(incoming_clock),
                        candidate.id,
                    );
                    if winner == Side::Incoming {
                        *current = candidate.clone();
                    }
                } else {
                    tracing::debug!(
                        request = current.id,
                        "refusing status regression from replication race"
                    );
                }
            }
        }
    }
    by_id.into_values().collect()
}

/// Merges transactions keyed by id. Transactions are immutable events, so
/// the union is a plain keyed insert with the default tie-break for the
/// (rare) case of divergent rows under one id.
pub fn merge_transactions(
    existing: &[ResourceTransaction],
    incoming: &[ResourceTransaction],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<ResourceTransaction> {
    let mut by_id: BTreeMap<i64, ResourceTransaction> =
        existing.iter().map(|t| (t.id, t.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let winner = pick_newer(
                    current.created_at.or(existing_clock),
                    current.id,
                    candidate.created_at.or(incoming_clock),
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

/// Merges advantage deductions keyed by id.
///
/// Specialized rule: once `reversed` is true it is permanent; a
/// conflicting write claiming `reversed:false` is ignored regardless of
/// timestamps.
pub fn merge_deductions(
    existing: &[AdvantageDeduction],
    incoming: &[AdvantageDeduction],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<AdvantageDeduction> {
    let mut by_id: BTreeMap<i64, AdvantageDeduction> =
        existing.iter().map(|d| (d.id, d.clone())).collect();
    for candidate in incoming {
        match by_id.get_mut(&candidate.id) {
            None => {
                by_id.insert(candidate.id, candidate.clone());
            }
            Some(current) => {
                let reversed = current.reversed || candidate.reversed;
                let winner = pick_newer(
                    current.merge_timestamp(existing_clock),
                    current.id,
                    candidate.merge_timestamp(incoming_clock),
                    candidate.id,
                );
                if winner == Side::Incoming {
                    *current = candidate.clone();
                }
                current.reversed = reversed;
            }
        }
    }
    by_id.into_values().collect()
}
