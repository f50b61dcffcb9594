//! Document fixtures.

use classboard_model::{
    CabinetItem, ScoreRecord, ScoreboardDocument, Student, Timestamp,
};
use chrono::NaiveDate;

/// A student with sensible defaults.
pub fn student_with_roll(id: i64, roll: &str) -> Student {
    Student {
        id,
        roll: roll.to_string(),
        name: format!("Student {id}"),
        base_name: format!("Student {id}"),
        class: 4 + (id % 6),
        group: "A".into(),
        fees: 500,
        vote_power: 1,
        stars: 0,
        vetos: 0,
        active: true,
        created_at: None,
        updated_at: None,
    }
}

/// A score row for one student on one day.
pub fn score_on(id: i64, student_id: i64, date: NaiveDate, points: i64, recorded_by: &str) -> ScoreRecord {
    ScoreRecord {
        id,
        student_id,
        date,
        month: classboard_model::month_key(date),
        points,
        stars: 0,
        vetos: 0,
        notes: String::new(),
        recorded_by: recorded_by.to_string(),
        created_at: None,
        updated_at: None,
    }
}

/// A document with `student_count` students, one catalog item and no
/// logical clock (so pushes built from it never trip the clock gate).
pub fn sample_document(student_count: usize) -> ScoreboardDocument {
    let mut doc = ScoreboardDocument::default();
    for i in 0..student_count {
        doc.students
            .push(student_with_roll(i as i64 + 1, &format!("EA24A{:02}", i + 1)));
    }
    doc.cabinet_items.push(CabinetItem {
        id: 3,
        name: "Geometry box".into(),
        cost: 50,
        stock: 4,
        active: true,
        updated_at: None,
    });
    doc
}

/// Like [`sample_document`] but with a fixed logical clock.
pub fn sample_document_at(student_count: usize, clock: &str) -> ScoreboardDocument {
    let mut doc = sample_document(student_count);
    doc.server_updated_at = Some(Timestamp::parse(clock).expect("fixture clock must parse"));
    doc
}

/// A document small enough to trip the default tiny-roster guard.
pub fn tiny_document() -> ScoreboardDocument {
    sample_document(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_document_is_well_formed() {
        let mut doc = sample_document(46);
        assert_eq!(doc.student_count(), 46);
        assert!(doc.normalize().is_ok());
        assert_eq!(doc.students[0].roll, "EA24A01");
    }

    #[test]
    fn tiny_document_is_tiny() {
        assert!(tiny_document().student_count() < 25);
    }
}
