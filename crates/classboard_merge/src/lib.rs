//! # classboard merge
//!
//! The entity merge engine: pure functions, one per collection, each
//! implementing a superset/no-data-loss merge with a documented tie-break.
//!
//! General contract: every merge is `merge(existing, incoming) -> merged`,
//! pure, and converges regardless of application order because each item's
//! identity key is stable and the tie-break is a deterministic function of
//! per-item timestamps, never of argument order.
//!
//! The default tie-break compares `updated_at` (falling back to
//! `created_at`, then the owning document's clock); the later item wins
//! wholesale for that identity key. On an exact tie, the higher
//! local-sequence id wins; if ids also tie, the existing side is kept.
//! Specialized rules per collection are documented on their functions.
//!
//! This is a pure computation crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attendance;
mod ballots;
mod document;
mod fees;
mod governance;
mod resources;
mod rosters;
mod scores;
mod students;
mod tiebreak;
mod veto_ledger;

pub use attendance::merge_attendance;
pub use ballots::{merge_appeals, merge_pending_results, merge_votes};
pub use document::merge_documents;
pub use fees::merge_fee_records;
pub use governance::{merge_class_reps, merge_group_crs, merge_leadership, merge_parties};
pub use resources::{
    merge_cabinet_items, merge_deductions, merge_requests, merge_transactions,
};
pub use rosters::merge_month_rosters;
pub use scores::merge_scores;
pub use students::merge_students;
pub use tiebreak::{pick_newer, Side};
pub use veto_ledger::recompute_veto_ledger;
