//! Role-scoped patch building and validation.
//!
//! Non-administrator actors never get to overwrite the document; each
//! write path produces a deliberately narrow patch from the submission,
//! and everything outside the actor's scope is discarded before merging.
//! A submission failing identity resolution or scope containment is
//! rejected outright, with no partial apply of an invalid write.

use crate::error::{SyncError, SyncResult};
use classboard_model::{
    month_key, Appeal, AppealStatus, ClockConfig, RequestStatus, ResourceRequest,
    ScoreboardDocument,
};
use std::collections::BTreeMap;

/// Who is writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    /// Full document writes.
    Admin,
    /// Current-month scores/attendance/appeals plus request triage.
    Teacher,
    /// Create-only resource requests and profile appeals.
    Student,
    /// An unauthenticated-by-login peer node, authenticated by shared
    /// secret at the transport boundary.
    Replica,
}

impl ActorRole {
    /// Parses the wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "admin" => Some(ActorRole::Admin),
            "teacher" => Some(ActorRole::Teacher),
            "student" => Some(ActorRole::Student),
            "replica" => Some(ActorRole::Replica),
            _ => None,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Admin => "admin",
            ActorRole::Teacher => "teacher",
            ActorRole::Student => "student",
            ActorRole::Replica => "replica",
        }
    }
}

/// What a replica push claims to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaPurpose {
    /// A whole-document sync between nodes.
    FullSync,
    /// A relayed teacher patch; stays teacher-narrow even when the
    /// receiving node is the authoritative master.
    TeacherPatch,
}

impl ReplicaPurpose {
    /// Parses the wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "full_sync" => Some(ReplicaPurpose::FullSync),
            "teacher_patch" => Some(ReplicaPurpose::TeacherPatch),
            _ => None,
        }
    }
}

/// Resolved identity and scope of the writing actor.
#[derive(Debug, Clone)]
pub struct ActorContext {
    /// The writer's role.
    pub role: ActorRole,
    /// Username (teacher) or roll (student); informational for admin.
    pub username: String,
    /// For replicas: the role the relayed write was authored under.
    pub replica_role: Option<ActorRole>,
    /// For replicas: the declared purpose.
    pub replica_purpose: Option<ReplicaPurpose>,
}

impl ActorContext {
    /// An administrator actor.
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            role: ActorRole::Admin,
            username: username.into(),
            replica_role: None,
            replica_purpose: None,
        }
    }

    /// A teacher actor.
    pub fn teacher(username: impl Into<String>) -> Self {
        Self {
            role: ActorRole::Teacher,
            username: username.into(),
            replica_role: None,
            replica_purpose: None,
        }
    }

    /// A student actor identified by roll.
    pub fn student(roll: impl Into<String>) -> Self {
        Self {
            role: ActorRole::Student,
            username: roll.into(),
            replica_role: None,
            replica_purpose: None,
        }
    }

    /// A replica actor with its declared role and purpose.
    pub fn replica(
        username: impl Into<String>,
        replica_role: Option<ActorRole>,
        replica_purpose: Option<ReplicaPurpose>,
    ) -> Self {
        Self {
            role: ActorRole::Replica,
            username: username.into(),
            replica_role,
            replica_purpose,
        }
    }
}

/// Builds the patch an actor is allowed to contribute.
///
/// - Admin: the submission as-is (already model-validated)
/// - Teacher: the teacher-narrow patch for the current month
/// - Replica declaring `teacher`/`teacher_patch`: the same teacher-narrow
///   patch, even while the receiving node is the authoritative master
/// - Replica otherwise: full-document sync
/// - Student: rejected; students use the dedicated builders below
pub fn build_actor_patch(
    actor: &ActorContext,
    submitted: &ScoreboardDocument,
    stored: &ScoreboardDocument,
    clock: &ClockConfig,
) -> SyncResult<ScoreboardDocument> {
    match actor.role {
        ActorRole::Admin => Ok(submitted.clone()),
        ActorRole::Teacher => Ok(build_teacher_patch(
            submitted,
            stored,
            &actor.username,
            &clock.current_month(),
        )),
        ActorRole::Replica => {
            if actor.replica_role == Some(ActorRole::Teacher)
                && actor.replica_purpose == Some(ReplicaPurpose::TeacherPatch)
            {
                Ok(build_teacher_patch(
                    submitted,
                    stored,
                    &actor.username,
                    &clock.current_month(),
                ))
            } else {
                Ok(submitted.clone())
            }
        }
        ActorRole::Student => Err(SyncError::rejected(
            "students cannot submit documents; use request or appeal endpoints",
        )),
    }
}

/// Builds the teacher-narrow patch.
///
/// Kept: score rows the teacher authored for the current month,
/// attendance rows for the current month, the teacher's own current-month
/// appeals, recommend/reject decisions (plus remarks) on existing
/// resource requests, and new requests created on a student's behalf
/// (cost always recomputed from the stored catalog). Every other
/// collection in the submission is discarded.
pub fn build_teacher_patch(
    submitted: &ScoreboardDocument,
    stored: &ScoreboardDocument,
    teacher: &str,
    current_month: &str,
) -> ScoreboardDocument {
    let mut patch = ScoreboardDocument::default();

    patch.scores = submitted
        .scores
        .iter()
        .filter(|s| s.month == current_month && s.recorded_by == teacher)
        .cloned()
        .collect();
    let dropped = submitted.scores.len() - patch.scores.len();
    if dropped > 0 {
        tracing::debug!(teacher, dropped, "dropped out-of-scope score rows");
    }

    patch.attendance = submitted
        .attendance
        .iter()
        .filter(|a| month_key(a.date) == current_month)
        .cloned()
        .collect();

    patch.appeals = submitted
        .appeals
        .iter()
        .filter(|a| a.author == teacher && a.month == current_month)
        .cloned()
        .collect();

    let stored_requests: BTreeMap<i64, &ResourceRequest> =
        stored.resource_requests.iter().map(|r| (r.id, r)).collect();
    for request in &submitted.resource_requests {
        match stored_requests.get(&request.id) {
            Some(existing) => {
                // Triage only: pending_teacher may move to recommended or
                // not_recommended; financial and quota fields stay as
                // stored no matter what the submission claims.
                if existing.status == RequestStatus::PendingTeacher
                    && matches!(
                        request.status,
                        RequestStatus::Recommended | RequestStatus::NotRecommended
                    )
                {
                    let mut triaged = (*existing).clone();
                    triaged.status = request.status;
                    triaged.teacher_remarks = request.teacher_remarks.clone();
                    triaged.updated_at = request.updated_at.or(existing.updated_at);
                    patch.resource_requests.push(triaged);
                } else {
                    tracing::debug!(request = request.id, "dropping out-of-scope request edit");
                }
            }
            None => {
                // Creation on a student's behalf: identity must resolve
                // and pricing comes from the catalog, not the caller.
                let Some(roll) = stored.roll_for_student_id(request.student_id) else {
                    tracing::debug!(request = request.id, "dropping request for unknown student");
                    continue;
                };
                let Some(item) = stored
                    .cabinet_items
                    .iter()
                    .find(|i| i.id == request.item_id && i.active)
                else {
                    tracing::debug!(request = request.id, "dropping request for unknown item");
                    continue;
                };
                let mut created = request.clone();
                created.roll = roll.to_string();
                created.cost = item.cost;
                created.status = RequestStatus::Recommended;
                created.requested_by = teacher.to_string();
                patch.resource_requests.push(created);
            }
        }
    }

    patch
}

/// Builds a create-only resource request for a student.
///
/// The server resolves the student from their login roll, validates the
/// referenced catalog item and computes cost itself; caller-supplied
/// pricing is never trusted beyond the catalog lookup.
pub fn build_student_request(
    stored: &ScoreboardDocument,
    roll: &str,
    item_id: i64,
    note: &str,
    clock: &ClockConfig,
) -> SyncResult<ResourceRequest> {
    let student_id = stored
        .student_id_for_roll(roll)
        .ok_or_else(|| SyncError::rejected(format!("unknown student roll {roll}")))?;
    let item = stored
        .cabinet_items
        .iter()
        .find(|i| i.id == item_id && i.active)
        .ok_or_else(|| SyncError::rejected(format!("unknown or inactive catalog item {item_id}")))?;

    let now = clock.now();
    Ok(ResourceRequest {
        id: ScoreboardDocument::next_id(stored.resource_requests.iter().map(|r| r.id)),
        student_id,
        roll: classboard_model::normalize_roll(roll),
        item_id,
        cost: item.cost,
        status: RequestStatus::PendingTeacher,
        note: note.to_string(),
        teacher_remarks: String::new(),
        requested_by: classboard_model::normalize_roll(roll),
        created_at: Some(now),
        updated_at: Some(now),
    })
}

/// Builds a profile-change appeal for a student.
///
/// Requested field changes are restricted to the allow-listed profile
/// fields; anything else is dropped rather than applied.
pub fn build_student_appeal(
    stored: &ScoreboardDocument,
    roll: &str,
    message: &str,
    field_changes: BTreeMap<String, String>,
    clock: &ClockConfig,
) -> SyncResult<Appeal> {
    if stored.student_id_for_roll(roll).is_none() {
        return Err(SyncError::rejected(format!("unknown student roll {roll}")));
    }

    let now = clock.now();
    let mut appeal = Appeal {
        id: ScoreboardDocument::next_id(stored.appeals.iter().map(|a| a.id)),
        roll: roll.to_string(),
        month: now.month_key(),
        author: classboard_model::normalize_roll(roll),
        message: message.to_string(),
        field_changes,
        status: AppealStatus::Open,
        created_at: Some(now),
        updated_at: Some(now),
    };
    appeal.normalize();
    if appeal.field_changes.is_empty() && message.trim().is_empty() {
        return Err(SyncError::rejected("appeal carries no allowed changes"));
    }
    Ok(appeal)
}
