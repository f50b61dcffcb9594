//! Election votes, pending results and appeals.

use crate::normalize::normalize_roll;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Profile fields a student may ask to change via an appeal.
pub const ALLOWED_PROFILE_FIELDS: &[&str] = &["name", "class", "group", "contact", "guardian"];

/// One ballot cast by one voter for one post.
///
/// Identity is the composite `(voter_roll, post_id)`; a duplicate
/// voter+post pair is rejected at the boundary, not merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionVote {
    /// Vote id.
    pub id: i64,
    /// Voter's roll code.
    #[serde(default)]
    pub voter_roll: String,
    /// The post voted on.
    #[serde(rename = "postId")]
    pub post_id: i64,
    /// Candidate the ballot names.
    #[serde(default)]
    pub candidate: String,
    /// When the ballot was cast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_at: Option<Timestamp>,
}

impl ElectionVote {
    /// Canonicalizes the voter roll.
    pub fn normalize(&mut self) {
        self.voter_roll = normalize_roll(&self.voter_roll);
    }

    /// Composite identity key.
    pub fn key(&self) -> (String, i64) {
        (self.voter_roll.clone(), self.post_id)
    }
}

/// A tallied but not-yet-applied election outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingResult {
    /// Result id.
    pub id: i64,
    /// The decided post.
    #[serde(rename = "postId")]
    pub post_id: i64,
    /// Winning candidate.
    #[serde(default)]
    pub winner: String,
    /// Whether the result has been applied to the leadership roster.
    #[serde(default)]
    pub applied: bool,
    /// When the result was declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_at: Option<Timestamp>,
}

/// Appeal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    /// Waiting for the administrator.
    Open,
    /// Accepted and applied.
    Accepted,
    /// Declined.
    Declined,
}

impl Default for AppealStatus {
    fn default() -> Self {
        AppealStatus::Open
    }
}

/// A request addressed to the administrator: a score dispute from a
/// teacher or a profile-change request from a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    /// Appeal id.
    pub id: i64,
    /// Roll of the student the appeal concerns.
    #[serde(default)]
    pub roll: String,
    /// "YYYY-MM" the appeal concerns.
    #[serde(default)]
    pub month: String,
    /// Username of the author (teacher or the student).
    #[serde(default)]
    pub author: String,
    /// Free-text case.
    #[serde(default)]
    pub message: String,
    /// Requested profile-field changes, keys restricted to
    /// [`ALLOWED_PROFILE_FIELDS`] at the validation boundary.
    #[serde(default)]
    pub field_changes: std::collections::BTreeMap<String, String>,
    /// Current status.
    #[serde(default)]
    pub status: AppealStatus,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Appeal {
    /// Canonicalizes the roll and drops non-allow-listed field changes.
    pub fn normalize(&mut self) {
        self.roll = normalize_roll(&self.roll);
        self.field_changes
            .retain(|k, _| ALLOWED_PROFILE_FIELDS.contains(&k.as_str()));
    }

    /// The best available merge timestamp, possibly backfilled.
    pub fn merge_timestamp(&self, document_clock: Option<Timestamp>) -> Option<Timestamp> {
        self.updated_at.or(self.created_at).or(document_clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_key_uses_normalized_roll() {
        let mut vote = ElectionVote {
            id: 1,
            voter_roll: "ea25b06".into(),
            post_id: 2,
            candidate: "Jay Arya".into(),
            cast_at: None,
        };
        vote.normalize();
        assert_eq!(vote.key(), ("EA25B06".to_string(), 2));
    }

    #[test]
    fn appeal_drops_disallowed_fields() {
        let mut appeal = Appeal {
            id: 1,
            roll: "ea24a01".into(),
            month: "2026-02".into(),
            author: "ea24a01".into(),
            message: "please fix my group".into(),
            field_changes: [
                ("group".to_string(), "B".to_string()),
                ("vote_power".to_string(), "99".to_string()),
            ]
            .into_iter()
            .collect(),
            status: AppealStatus::Open,
            created_at: None,
            updated_at: None,
        };
        appeal.normalize();
        assert_eq!(appeal.roll, "EA24A01");
        assert!(appeal.field_changes.contains_key("group"));
        assert!(!appeal.field_changes.contains_key("vote_power"));
    }
}
