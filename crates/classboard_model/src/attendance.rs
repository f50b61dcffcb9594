//! Attendance records.

use crate::normalize::normalize_roll;
use crate::timestamp::Timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attendance state for one student on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Present in class.
    Present,
    /// Absent.
    Absent,
    /// Arrived late.
    Late,
    /// Absence excused by a teacher.
    Excused,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Absent
    }
}

/// One attendance row per `(date, roll)`.
///
/// Roll-based identity takes precedence over the local numeric student id
/// because ids are not globally stable across peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Local sequence id.
    #[serde(default)]
    pub id: i64,
    /// Owning student's local id (advisory; roll wins).
    #[serde(rename = "studentId", default)]
    pub student_id: i64,
    /// Roll code of the student.
    #[serde(default)]
    pub roll: String,
    /// The calendar day.
    pub date: NaiveDate,
    /// Attendance state.
    #[serde(default)]
    pub status: AttendanceStatus,
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

impl AttendanceRecord {
    /// Canonicalizes the roll code.
    pub fn normalize(&mut self) {
        self.roll = normalize_roll(&self.roll);
    }

    /// The best available merge timestamp, possibly backfilled.
    pub fn merge_timestamp(&self, document_clock: Option<Timestamp>) -> Option<Timestamp> {
        self.updated_at.or(self.created_at).or(document_clock)
    }
}
