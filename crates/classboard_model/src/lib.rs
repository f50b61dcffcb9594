//! # classboard model
//!
//! Typed model for the shared scoreboard document.
//!
//! This crate provides:
//! - The [`ScoreboardDocument`] aggregate and its collections
//! - A timezone-aware [`Timestamp`] acting as the document's logical clock
//! - Per-collection validation and normalization at the wire boundary
//! - The resource-request status state machine
//!
//! The wire document is JSON-shaped. It is converted into typed, validated
//! values exactly once, before any merge logic runs. Downstream crates never
//! see raw `serde_json::Value`s for entity data.
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attendance;
mod ballots;
mod document;
mod error;
mod fees;
mod governance;
mod normalize;
mod notices;
mod resources;
mod score;
mod student;
mod timestamp;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use ballots::{Appeal, AppealStatus, ElectionVote, PendingResult, ALLOWED_PROFILE_FIELDS};
pub use document::{MonthlySummary, ScoreboardDocument};
pub use error::{ModelError, ModelResult};
pub use fees::{FeePayment, FeeRecord};
pub use governance::{
    ClassRep, GroupCr, LeadershipPost, Party, PostStatus, tenure_months_for_post,
    veto_quota_for_post,
};
pub use normalize::{normalize_name_key, normalize_roll, parse_name_meta};
pub use notices::{Notification, SyllabusEntry};
pub use resources::{
    AdvantageDeduction, CabinetItem, RequestStatus, ResourceRequest, ResourceTransaction,
};
pub use score::{ScoreRecord, MAX_POINTS, MAX_STARS, MAX_VETOS, MIN_POINTS};
pub use student::Student;
pub use timestamp::{month_key, parse_utc_offset, ClockConfig, Timestamp};
