//! Proptest strategies for document entities.

use classboard_model::{ScoreRecord, Student, Timestamp};
use proptest::prelude::*;

/// Strategy for plausible roll codes.
pub fn roll_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("EA2[4-6][A-D][0-2][0-9]").expect("invalid regex")
}

/// Strategy for timestamps inside one February week, so generated items
/// exercise both orderings and exact ties.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (1u32..8, 0u32..24, 0u32..60).prop_map(|(day, hour, minute)| {
        Timestamp::parse(&format!(
            "2026-02-{day:02}T{hour:02}:{minute:02}:00+05:30"
        ))
        .expect("generated timestamp must parse")
    })
}

/// Strategy for students.
pub fn student_strategy() -> impl Strategy<Value = Student> {
    (
        1i64..100,
        roll_strategy(),
        any::<bool>(),
        proptest::option::of(timestamp_strategy()),
    )
        .prop_map(|(id, roll, active, updated_at)| Student {
            id,
            roll,
            name: format!("Student {id}"),
            base_name: format!("Student {id}"),
            class: 4,
            group: "A".into(),
            fees: 500,
            vote_power: 1,
            stars: 0,
            vetos: 0,
            active,
            created_at: None,
            updated_at,
        })
}

/// Strategy for score rows within one month.
pub fn score_strategy() -> impl Strategy<Value = ScoreRecord> {
    (
        1i64..50,
        1i64..10,
        1u32..28,
        -100i64..200,
        proptest::option::of(timestamp_strategy()),
    )
        .prop_map(|(id, student_id, day, points, updated_at)| ScoreRecord {
            id,
            student_id,
            date: format!("2026-02-{day:02}").parse().expect("valid date"),
            month: "2026-02".into(),
            points,
            stars: 0,
            vetos: 0,
            notes: String::new(),
            recorded_by: "admin".into(),
            created_at: None,
            updated_at,
        })
}
