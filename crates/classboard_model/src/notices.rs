//! Notifications and syllabus tracking.

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// A broadcast notice shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification id.
    pub id: i64,
    /// Message body.
    #[serde(default)]
    pub message: String,
    /// Audience hint, e.g. "all", "teachers".
    #[serde(default)]
    pub audience: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Notification {
    /// The best available merge timestamp, possibly backfilled.
    pub fn merge_timestamp(&self, document_clock: Option<Timestamp>) -> Option<Timestamp> {
        self.updated_at.or(self.created_at).or(document_clock)
    }
}

/// Progress through one syllabus topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusEntry {
    /// Entry id.
    pub id: i64,
    /// Subject name.
    #[serde(default)]
    pub subject: String,
    /// Topic within the subject.
    #[serde(default)]
    pub topic: String,
    /// Completion percentage, clamped to 0..=100.
    #[serde(default)]
    pub progress: i64,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl SyllabusEntry {
    /// Clamps progress into range.
    pub fn normalize(&mut self) {
        self.progress = self.progress.clamp(0, 100);
    }

    /// The best available merge timestamp, possibly backfilled.
    pub fn merge_timestamp(&self, document_clock: Option<Timestamp>) -> Option<Timestamp> {
        self.updated_at.or(document_clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_clamped() {
        let mut entry = SyllabusEntry {
            id: 1,
            subject: "English".into(),
            topic: "Tenses".into(),
            progress: 180,
            updated_at: None,
        };
        entry.normalize();
        assert_eq!(entry.progress, 100);
    }
}
