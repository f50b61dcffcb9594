//! Attendance merge with roll-based identity resolution.

use crate::tiebreak::{pick_newer, Side};
use chrono::NaiveDate;
use classboard_model::{AttendanceRecord, Student, Timestamp};
use std::collections::BTreeMap;

/// Identity of an attendance row once resolved.
///
/// Roll-based identity takes precedence; raw local id is the fallback
/// only when no roll can be resolved from either side's student list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Roll(NaiveDate, String),
    Id(NaiveDate, i64),
}

fn resolve_key(record: &AttendanceRecord, id_to_roll: &BTreeMap<i64, String>) -> Key {
    if !record.roll.is_empty() {
        return Key::Roll(record.date, record.roll.clone());
    }
    if let Some(roll) = id_to_roll.get(&record.student_id) {
        return Key::Roll(record.date, roll.clone());
    }
    Key::Id(record.date, record.student_id)
}

/// Merges attendance rows keyed by `(date, roll)`.
///
/// The roll lookup table is built from both sides' student lists because
/// local numeric student ids are not portable across peers.
pub fn merge_attendance(
    existing: &[AttendanceRecord],
    incoming: &[AttendanceRecord],
    existing_students: &[Student],
    incoming_students: &[Student],
    existing_clock: Option<Timestamp>,
    incoming_clock: Option<Timestamp>,
) -> Vec<AttendanceRecord> {
    let mut id_to_roll: BTreeMap<i64, String> = BTreeMap::new();
    for s in existing_students.iter().chain(incoming_students) {
        id_to_roll.entry(s.id).or_insert_with(|| s.roll.clone());
    }

    let mut by_key: BTreeMap<Key, AttendanceRecord> = BTreeMap::new();
    for record in existing {
        let mut record = record.clone();
        if let Key::Roll(_, roll) = resolve_key(&record, &id_to_roll) {
            record.roll = roll;
        }
        by_key.insert(resolve_key(&record, &id_to_roll), record);
    }

    for candidate in incoming {
        let mut candidate = candidate.clone();
        if let Key::Roll(_, roll) = resolve_key(&candidate, &id_to_roll) {
            candidate.roll = roll;
        }
        let key = resolve_key(&candidate, &id_to_roll);
        match by_key.get_mut(&key) {
            None => {
                by_key.insert(key, candidate);
            }
            Some(current) => {
                let winner = pick_newer(
                    current.merge_timestamp(existing_clock),
                    current.id,
                    candidate.merge_timestamp(incoming_clock),
                    candidate.id,
                );
                if winner == Side::Incoming {
                    *current = candidate;
                }
            }
        }
    }

    by_key.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use classboard_model::AttendanceStatus;

    fn student(id: i64, roll: &str) -> Student {
        Student {
            id,
            roll: roll.into(),
            name: roll.into(),
            base_name: roll.into(),
            class: 9,
            group: "D".into(),
            fees: 0,
            vote_power: 1,
            stars: 0,
            vetos: 0,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn record(id: i64, student_id: i64, roll: &str, date: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id,
            student_id,
            roll: roll.into(),
            date: date.parse().unwrap(),
            status,
            recorded_by: "teacher1".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn same_roll_different_local_ids_is_one_row() {
        // Peer A numbered the student 3; peer B numbered them 7.
        let a_students = vec![student(3, "EA24A04")];
        let b_students = vec![student(7, "EA24A04")];
        let a = vec![record(1, 3, "", "2026-02-02", AttendanceStatus::Present)];
        let b = vec![record(9, 7, "", "2026-02-02", AttendanceStatus::Late)];

        let merged = merge_attendance(&a, &b, &a_students, &b_students, None, None);
        assert_eq!(merged.len(), 1);
        // Incoming id 9 wins the timestampless tie.
        assert_eq!(merged[0].status, AttendanceStatus::Late);
        assert_eq!(merged[0].roll, "EA24A04");
    }

    #[test]
    fn unresolvable_id_falls_back_to_raw_id_key() {
        let a = vec![record(1, 99, "", "2026-02-02", AttendanceStatus::Present)];
        let b = vec![record(2, 98, "", "2026-02-02", AttendanceStatus::Absent)];
        let merged = merge_attendance(&a, &b, &[], &[], None, None);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn explicit_roll_beats_id_lookup() {
        let a = vec![record(1, 3, "EA24A04", "2026-02-02", AttendanceStatus::Present)];
        let b = vec![record(2, 55, "ea24a04", "2026-02-02", AttendanceStatus::Excused)];
        // Model normalization upper-cases rolls before merge; simulate it.
        let mut b = b;
        b[0].normalize();
        let merged = merge_attendance(&a, &b, &[], &[], None, None);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status, AttendanceStatus::Excused);
    }

    #[test]
    fn merge_is_idempotent() {
        let students = vec![student(3, "EA24A04")];
        let a = vec![record(1, 3, "", "2026-02-02", AttendanceStatus::Present)];
        let b = vec![record(2, 3, "", "2026-02-02", AttendanceStatus::Absent)];
        let once = merge_attendance(&a, &b, &students, &students, None, None);
        let twice = merge_attendance(&once, &b, &students, &students, None, None);
        assert_eq!(once, twice);
    }
}
