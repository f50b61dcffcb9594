//! Daily score records.

use crate::timestamp::{month_key, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lowest accepted per-day points value.
pub const MIN_POINTS: i64 = -1000;
/// Highest accepted per-day points value.
pub const MAX_POINTS: i64 = 1000;
/// Highest accepted per-day stars value.
pub const MAX_STARS: i64 = 100;
/// Highest accepted per-day vetos value.
pub const MAX_VETOS: i64 = 50;

/// One row per student per calendar day.
///
/// Identity across peers is `(student_id, date)`. The `month` field is
/// derived from `date` and kept consistent for fast month filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Local sequence id. Used only as the last-resort tie-break.
    #[serde(default)]
    pub id: i64,
    /// Owning student's local id.
    #[serde(rename = "studentId")]
    pub student_id: i64,
    /// The calendar day this row covers.
    pub date: NaiveDate,
    /// Derived "YYYY-MM" month key, always consistent with `date`.
    #[serde(default)]
    pub month: String,
    /// Points awarded.
    #[serde(default)]
    pub points: i64,
    /// Stars awarded.
    #[serde(default)]
    pub stars: i64,
    /// Vetos recorded.
    #[serde(default)]
    pub vetos: i64,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
    /// Username of the recording actor.
    #[serde(default)]
    pub recorded_by: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl ScoreRecord {
    /// Rederives `month` from `date` and clamps counters to their bounds.
    pub fn normalize(&mut self) {
        self.month = month_key(self.date);
        self.points = self.points.clamp(MIN_POINTS, MAX_POINTS);
        self.stars = self.stars.clamp(0, MAX_STARS);
        self.vetos = self.vetos.clamp(0, MAX_VETOS);
    }

    /// Identity key across peers.
    pub fn key(&self) -> (i64, NaiveDate) {
        (self.student_id, self.date)
    }

    /// The best available merge timestamp, possibly backfilled.
    ///
    /// Missing timestamps are filled from `created_at` or the document
    /// clock before comparison, never left absent: an absent timestamp
    /// would otherwise always lose.
    pub fn merge_timestamp(&self, document_clock: Option<Timestamp>) -> Option<Timestamp> {
        self.updated_at.or(self.created_at).or(document_clock)
    }

    /// Net score contribution with the standard star/veto weights.
    pub fn net_score(&self) -> i64 {
        self.points + self.stars * 10 - self.vetos * 5
    }
}
