//! Resource cabinet, requests, transactions and advantage deductions.

use crate::error::{ModelError, ModelResult};
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// An item in the resource cabinet catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabinetItem {
    /// Catalog id.
    pub id: i64,
    /// Item name.
    #[serde(default)]
    pub name: String,
    /// Cost in points. The server computes request cost from this value;
    /// caller-supplied pricing is never trusted.
    #[serde(default)]
    pub cost: i64,
    /// Units on hand.
    #[serde(default)]
    pub stock: i64,
    /// Whether the item can currently be requested.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

fn default_true() -> bool {
    true
}

/// Lifecycle of a resource request.
///
/// The order below is a ratchet: merges take the side with the higher
/// [`RequestStatus::rank`], so an administrative decision is never rolled
/// back by a replication race, even one with a newer timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Being composed by the student; not yet visible to teachers.
    Draft,
    /// Awaiting a teacher's recommendation.
    PendingTeacher,
    /// Recommended by a teacher.
    Recommended,
    /// Not recommended by a teacher (admin can still decide).
    NotRecommended,
    /// Awaiting the administrator's decision.
    PendingAdmin,
    /// Approved by the administrator.
    Approved,
    /// Rejected by the administrator.
    Rejected,
    /// Closed without fulfilment.
    Cancelled,
    /// Goods handed over.
    Fulfilled,
}

impl RequestStatus {
    /// Position in the fixed state ordering; higher never regresses.
    ///
    /// `Fulfilled` outranks `Cancelled` so a race between fulfil and
    /// cancel resolves toward the decision that shipped goods.
    pub fn rank(&self) -> u8 {
        match self {
            RequestStatus::Draft => 0,
            RequestStatus::PendingTeacher => 1,
            RequestStatus::Recommended | RequestStatus::NotRecommended => 2,
            RequestStatus::PendingAdmin => 3,
            RequestStatus::Approved | RequestStatus::Rejected => 4,
            RequestStatus::Cancelled => 5,
            RequestStatus::Fulfilled => 6,
        }
    }

    /// Returns true if `self -> to` is an allowed forward transition.
    pub fn can_transition(&self, to: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, to),
            (Draft, PendingTeacher)
                | (PendingTeacher, Recommended)
                | (PendingTeacher, NotRecommended)
                | (Recommended, PendingAdmin)
                | (NotRecommended, PendingAdmin)
                | (PendingAdmin, Approved)
                | (PendingAdmin, Rejected)
                | (Approved, Fulfilled)
                | (Approved, Cancelled)
                | (Rejected, Cancelled)
        )
    }

    /// Returns true for states with no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Fulfilled | RequestStatus::Cancelled)
    }

    /// Parses the snake_case wire name.
    pub fn parse(value: &str) -> ModelResult<Self> {
        match value.trim() {
            "draft" => Ok(RequestStatus::Draft),
            "pending_teacher" => Ok(RequestStatus::PendingTeacher),
            "recommended" => Ok(RequestStatus::Recommended),
            "not_recommended" => Ok(RequestStatus::NotRecommended),
            "pending_admin" => Ok(RequestStatus::PendingAdmin),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            "cancelled" => Ok(RequestStatus::Cancelled),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            other => Err(ModelError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Draft
    }
}

/// A student's request for a cabinet item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Request id.
    pub id: i64,
    /// Requesting student's local id.
    #[serde(rename = "studentId")]
    pub student_id: i64,
    /// Requesting student's roll (portable identity).
    #[serde(default)]
    pub roll: String,
    /// Requested catalog item.
    #[serde(rename = "itemId")]
    pub item_id: i64,
    /// Cost in points, computed server-side from the catalog.
    #[serde(default)]
    pub cost: i64,
    /// Lifecycle state.
    #[serde(default)]
    pub status: RequestStatus,
    /// Student's note.
    #[serde(default)]
    pub note: String,
    /// Teacher's recommendation remarks.
    #[serde(default)]
    pub teacher_remarks: String,
    /// Username of the creating actor.
    #[serde(default)]
    pub requested_by: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl ResourceRequest {
    /// The best available merge timestamp, possibly backfilled.
    pub fn merge_timestamp(&self, document_clock: Option<Timestamp>) -> Option<Timestamp> {
        self.updated_at.or(self.created_at).or(document_clock)
    }
}

/// A point movement caused by a fulfilled request or a manual adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTransaction {
    /// Transaction id.
    pub id: i64,
    /// Related request, if any.
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    /// Affected student's local id.
    #[serde(rename = "studentId")]
    pub student_id: i64,
    /// Signed point amount.
    #[serde(default)]
    pub amount: i64,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

/// A deduction of earned advantage, reversible exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvantageDeduction {
    /// Deduction id.
    pub id: i64,
    /// Affected student's local id.
    #[serde(rename = "studentId")]
    pub student_id: i64,
    /// Points deducted.
    #[serde(default)]
    pub amount: i64,
    /// Why the deduction was made.
    #[serde(default)]
    pub reason: String,
    /// Once true, permanently true: a reversal is never un-reversed,
    /// regardless of timestamps.
    #[serde(default)]
    pub reversed: bool,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl AdvantageDeduction {
    /// The best available merge timestamp, possibly backfilled.
    pub fn merge_timestamp(&self, document_clock: Option<Timestamp>) -> Option<Timestamp> {
        self.updated_at.or(self.created_at).or(document_clock)
    }
}
