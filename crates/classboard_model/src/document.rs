//! The shared scoreboard document aggregate.

use crate::attendance::AttendanceRecord;
use crate::ballots::{Appeal, ElectionVote, PendingResult};
use crate::error::{ModelError, ModelResult};
use crate::fees::FeeRecord;
use crate::governance::{ClassRep, GroupCr, LeadershipPost, Party};
use crate::notices::{Notification, SyllabusEntry};
use crate::resources::{AdvantageDeduction, CabinetItem, ResourceRequest, ResourceTransaction};
use crate::score::ScoreRecord;
use crate::student::Student;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The single shared aggregate of all scoreboard collections.
///
/// `server_updated_at` is the document's logical clock: top-level
/// accept/reject decisions compare it, while item-level timestamps drive
/// per-item merge tie-breaks. All collections default to empty so a
/// narrow patch parses with the same type as a full document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardDocument {
    /// Logical clock for the whole document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_updated_at: Option<Timestamp>,
    /// Student roster.
    #[serde(default)]
    pub students: Vec<Student>,
    /// Daily score rows.
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
    /// Attendance rows.
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    /// Per-student fee state.
    #[serde(default)]
    pub fee_records: Vec<FeeRecord>,
    /// Resource cabinet catalog.
    #[serde(default)]
    pub cabinet_items: Vec<CabinetItem>,
    /// Resource requests.
    #[serde(default)]
    pub resource_requests: Vec<ResourceRequest>,
    /// Resource transactions.
    #[serde(default)]
    pub resource_transactions: Vec<ResourceTransaction>,
    /// Advantage deductions.
    #[serde(default)]
    pub advantage_deductions: Vec<AdvantageDeduction>,
    /// Leadership posts.
    #[serde(default)]
    pub leadership: Vec<LeadershipPost>,
    /// Class representatives.
    #[serde(default)]
    pub class_reps: Vec<ClassRep>,
    /// Group CRs.
    #[serde(default)]
    pub group_crs: Vec<GroupCr>,
    /// Parties.
    #[serde(default)]
    pub parties: Vec<Party>,
    /// Election ballots.
    #[serde(default)]
    pub election_votes: Vec<ElectionVote>,
    /// Declared-but-unapplied election results.
    #[serde(default)]
    pub pending_results: Vec<PendingResult>,
    /// Appeals to the administrator.
    #[serde(default)]
    pub appeals: Vec<Appeal>,
    /// Notifications.
    #[serde(default)]
    pub notifications: Vec<Notification>,
    /// Syllabus tracking.
    #[serde(default)]
    pub syllabus: Vec<SyllabusEntry>,
    /// Known rolls per "YYYY-MM" month; only ever grows via set union.
    #[serde(default)]
    pub month_rosters: BTreeMap<String, BTreeSet<String>>,
    /// Derived (month -> roll -> granted veto allowance). Recomputed on
    /// every accepted write, never merged.
    #[serde(default)]
    pub role_veto_monthly: BTreeMap<String, BTreeMap<String, i64>>,
}

/// Per-student totals for one month, derived from merged scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Student's local id.
    pub student_id: i64,
    /// Roll code.
    pub roll: String,
    /// Total points for the month.
    pub points: i64,
    /// Total stars for the month.
    pub stars: i64,
    /// Total vetos for the month.
    pub vetos: i64,
    /// Weighted net score (10 per star, -5 per veto).
    pub net_score: i64,
}

impl ScoreboardDocument {
    /// Parses and validates a wire JSON string.
    pub fn from_json_str(raw: &str) -> ModelResult<Self> {
        let mut doc: ScoreboardDocument = serde_json::from_str(raw)?;
        doc.normalize()?;
        Ok(doc)
    }

    /// Parses and validates a wire JSON value.
    pub fn from_json_value(value: serde_json::Value) -> ModelResult<Self> {
        let mut doc: ScoreboardDocument = serde_json::from_value(value)?;
        doc.normalize()?;
        Ok(doc)
    }

    /// Serializes to a JSON value.
    pub fn to_json_value(&self) -> ModelResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Validates and normalizes every collection in place.
    ///
    /// This is the single boundary conversion: after it succeeds, merge
    /// logic can rely on canonical rolls, derived months, clamped
    /// counters and duplicate-free ballots.
    pub fn normalize(&mut self) -> ModelResult<()> {
        for student in &mut self.students {
            student.normalize();
            if student.roll.is_empty() {
                return Err(ModelError::MissingIdentity {
                    collection: "students",
                    detail: format!("student id {} has an empty roll", student.id),
                });
            }
        }
        for score in &mut self.scores {
            score.normalize();
        }
        for record in &mut self.attendance {
            record.normalize();
            if record.roll.is_empty() && record.student_id == 0 {
                return Err(ModelError::MissingIdentity {
                    collection: "attendance",
                    detail: format!("attendance id {} has neither roll nor student id", record.id),
                });
            }
        }
        for fee in &mut self.fee_records {
            fee.normalize();
        }
        for post in &mut self.leadership {
            post.normalize();
        }
        for party in &mut self.parties {
            party.normalize();
        }
        for appeal in &mut self.appeals {
            appeal.normalize();
        }
        for entry in &mut self.syllabus {
            entry.normalize();
        }

        // Duplicate voter+post ballots are rejected at the boundary: the
        // first occurrence wins, later ones are dropped.
        let mut seen = BTreeSet::new();
        for vote in &mut self.election_votes {
            vote.normalize();
        }
        self.election_votes.retain(|v| seen.insert(v.key()));

        // Month rosters always include every roll the document knows.
        let rolls = self.roll_set();
        for roster in self.month_rosters.values_mut() {
            let normalized: BTreeSet<String> = roster
                .iter()
                .map(|r| crate::normalize::normalize_roll(r))
                .collect();
            *roster = normalized;
        }
        if let Some(clock) = self.server_updated_at {
            self.month_rosters
                .entry(clock.month_key())
                .or_default()
                .extend(rolls);
        }
        Ok(())
    }

    /// The set of known rolls (active and inactive).
    pub fn roll_set(&self) -> BTreeSet<String> {
        self.students.iter().map(|s| s.roll.clone()).collect()
    }

    /// Total number of student records.
    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Number of logically active student records.
    pub fn active_student_count(&self) -> usize {
        self.students.iter().filter(|s| s.active).count()
    }

    /// Maps a local student id to its roll, if known.
    pub fn roll_for_student_id(&self, id: i64) -> Option<&str> {
        self.students
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.roll.as_str())
    }

    /// Maps a roll to the local student id, if known.
    pub fn student_id_for_roll(&self, roll: &str) -> Option<i64> {
        let roll = crate::normalize::normalize_roll(roll);
        self.students
            .iter()
            .find(|s| s.roll == roll)
            .map(|s| s.id)
    }

    /// The next free local id for a collection of ids.
    pub fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
        ids.max().unwrap_or(0) + 1
    }

    /// Sizes of every collection, for health reporting.
    pub fn collection_sizes(&self) -> BTreeMap<&'static str, usize> {
        let mut sizes = BTreeMap::new();
        sizes.insert("students", self.students.len());
        sizes.insert("scores", self.scores.len());
        sizes.insert("attendance", self.attendance.len());
        sizes.insert("fee_records", self.fee_records.len());
        sizes.insert("cabinet_items", self.cabinet_items.len());
        sizes.insert("resource_requests", self.resource_requests.len());
        sizes.insert("resource_transactions", self.resource_transactions.len());
        sizes.insert("advantage_deductions", self.advantage_deductions.len());
        sizes.insert("leadership", self.leadership.len());
        sizes.insert("class_reps", self.class_reps.len());
        sizes.insert("group_crs", self.group_crs.len());
        sizes.insert("parties", self.parties.len());
        sizes.insert("election_votes", self.election_votes.len());
        sizes.insert("pending_results", self.pending_results.len());
        sizes.insert("appeals", self.appeals.len());
        sizes.insert("notifications", self.notifications.len());
        sizes.insert("syllabus", self.syllabus.len());
        sizes
    }

    /// Per-student totals for one "YYYY-MM" month, sorted by net score
    /// descending, then roll ascending for a stable order.
    pub fn monthly_summary(&self, month: &str) -> Vec<MonthlySummary> {
        let mut totals: BTreeMap<i64, (i64, i64, i64)> = BTreeMap::new();
        for score in self.scores.iter().filter(|s| s.month == month) {
            let entry = totals.entry(score.student_id).or_insert((0, 0, 0));
            entry.0 += score.points;
            entry.1 += score.stars;
            entry.2 += score.vetos;
        }
        let mut out: Vec<MonthlySummary> = totals
            .into_iter()
            .map(|(student_id, (points, stars, vetos))| MonthlySummary {
                student_id,
                roll: self
                    .roll_for_student_id(student_id)
                    .unwrap_or_default()
                    .to_string(),
                points,
                stars,
                vetos,
                net_score: points + stars * 10 - vetos * 5,
            })
            .collect();
        out.sort_by(|a, b| b.net_score.cmp(&a.net_score).then(a.roll.cmp(&b.roll)));
        out
    }

    /// Sets the logical clock.
    pub fn touch(&mut self, now: Timestamp) {
        self.server_updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "server_updated_at": "2026-02-03T10:00:00+05:30",
            "students": [
                {"id": 12, "roll": "ea25b06", "name": "Jay Arya***", "class": 5, "group": "B"},
                {"id": 13, "roll": "EA25B10", "name": "Shiva Mallick (v)", "class": 5, "group": "B"}
            ],
            "scores": [
                {"id": 5, "studentId": 12, "date": "2026-02-02", "points": 60}
            ],
            "election_votes": [
                {"id": 1, "voter_roll": "EA25B06", "postId": 1, "candidate": "X"},
                {"id": 2, "voter_roll": "ea25b06", "postId": 1, "candidate": "Y"}
            ]
        })
    }

    #[test]
    fn parse_normalizes_everything() {
        let doc = ScoreboardDocument::from_json_value(sample_json()).unwrap();
        assert_eq!(doc.students[0].roll, "EA25B06");
        assert_eq!(doc.students[0].stars, 3);
        assert_eq!(doc.scores[0].month, "2026-02");
        // Duplicate voter+post ballot dropped.
        assert_eq!(doc.election_votes.len(), 1);
        assert_eq!(doc.election_votes[0].candidate, "X");
        // Roster backfilled into the clock's month.
        assert!(doc.month_rosters["2026-02"].contains("EA25B10"));
    }

    #[test]
    fn empty_roll_is_rejected() {
        let value = serde_json::json!({
            "students": [{"id": 1, "roll": "  "}]
        });
        let err = ScoreboardDocument::from_json_value(value).unwrap_err();
        assert!(matches!(err, ModelError::MissingIdentity { .. }));
    }

    #[test]
    fn empty_document_parses() {
        let doc = ScoreboardDocument::from_json_str("{}").unwrap();
        assert_eq!(doc.student_count(), 0);
        assert!(doc.server_updated_at.is_none());
    }

    #[test]
    fn id_roll_lookups() {
        let doc = ScoreboardDocument::from_json_value(sample_json()).unwrap();
        assert_eq!(doc.roll_for_student_id(12), Some("EA25B06"));
        assert_eq!(doc.student_id_for_roll("ea25b10"), Some(13));
        assert_eq!(doc.student_id_for_roll("EA99Z99"), None);
    }

    #[test]
    fn monthly_summary_ranks_by_net_score() {
        let mut doc = ScoreboardDocument::from_json_value(sample_json()).unwrap();
        doc.scores.push(ScoreRecord {
            id: 6,
            student_id: 13,
            date: "2026-02-02".parse().unwrap(),
            month: "2026-02".into(),
            points: 10,
            stars: 9,
            vetos: 0,
            notes: String::new(),
            recorded_by: String::new(),
            created_at: None,
            updated_at: None,
        });
        let summary = doc.monthly_summary("2026-02");
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].student_id, 13);
        assert_eq!(summary[0].net_score, 100);
        assert_eq!(summary[1].net_score, 60);
    }

    #[test]
    fn roundtrip_via_json() {
        let doc = ScoreboardDocument::from_json_value(sample_json()).unwrap();
        let value = doc.to_json_value().unwrap();
        let back = ScoreboardDocument::from_json_value(value).unwrap();
        assert_eq!(doc, back);
    }
}
