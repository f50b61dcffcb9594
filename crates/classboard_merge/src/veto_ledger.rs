//! Derived role-veto-monthly ledger.

use classboard_model::{normalize_name_key, PostStatus, ScoreboardDocument};
use std::collections::BTreeMap;

/// Recomputes the `(month, roll) -> granted veto allowance` ledger.
///
/// The ledger is derived, recomputed on every accepted write, never
/// merged: it keeps the running veto counter consistent with active
/// office-holder tenures. Leadership holders are matched to rolls via
/// normalized base names; class reps and group CRs carry rolls directly
/// and earn the standard CR allowance of 2.
pub fn recompute_veto_ledger(document: &mut ScoreboardDocument) {
    let mut ledger: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();

    // Name-key lookup so holder display names resolve to rolls.
    let mut name_to_roll: BTreeMap<String, String> = BTreeMap::new();
    for student in &document.students {
        let key = if student.base_name.is_empty() {
            normalize_name_key(&student.name)
        } else {
            normalize_name_key(&student.base_name)
        };
        if !key.is_empty() {
            name_to_roll.entry(key).or_insert_with(|| student.roll.clone());
        }
    }

    let base_month = document
        .server_updated_at
        .map(|t| t.month_key())
        .unwrap_or_default();

    for post in &document.leadership {
        if post.status != PostStatus::Active || !post.is_populated() || post.veto_quota <= 0 {
            continue;
        }
        let Some(roll) = name_to_roll.get(&normalize_name_key(&post.holder)) else {
            tracing::debug!(post = %post.post, holder = %post.holder, "holder has no roster match");
            continue;
        };
        let start = post
            .since_month
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| base_month.clone());
        if start.is_empty() {
            continue;
        }
        for offset in 0..post.tenure_months.max(1) {
            if let Some(month) = add_months(&start, offset) {
                *ledger
                    .entry(month)
                    .or_default()
                    .entry(roll.clone())
                    .or_insert(0) += post.veto_quota;
            }
        }
    }

    if !base_month.is_empty() {
        for rep in &document.class_reps {
            if rep.status == PostStatus::Active && !rep.roll.is_empty() {
                *ledger
                    .entry(base_month.clone())
                    .or_default()
                    .entry(rep.roll.clone())
                    .or_insert(0) += 2;
            }
        }
        for cr in &document.group_crs {
            if cr.status == PostStatus::Active && !cr.roll.is_empty() {
                *ledger
                    .entry(base_month.clone())
                    .or_default()
                    .entry(cr.roll.clone())
                    .or_insert(0) += 2;
            }
        }
    }

    document.role_veto_monthly = ledger;
}

/// Adds `offset` months to a "YYYY-MM" key.
fn add_months(month: &str, offset: u32) -> Option<String> {
    let (year, month_num) = month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month_num: u32 = month_num.parse().ok()?;
    if !(1..=12).contains(&month_num) {
        return None;
    }
    let total = year * 12 + (month_num - 1) as i32 + offset as i32;
    Some(format!("{:04}-{:02}", total / 12, total % 12 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use classboard_model::{LeadershipPost, ScoreboardDocument, Student, Timestamp};

    fn document() -> ScoreboardDocument {
        let mut doc = ScoreboardDocument::default();
        doc.server_updated_at = Some(Timestamp::parse("2026-02-03T10:00:00+05:30").unwrap());
        doc.students.push(Student {
            id: 40,
            roll: "EA25D20".into(),
            name: "Harsh Mallik****** (VVV) (L)".into(),
            base_name: "Harsh Mallik".into(),
            class: 9,
            group: "D".into(),
            fees: 1500,
            vote_power: 3,
            stars: 6,
            vetos: 3,
            active: true,
            created_at: None,
            updated_at: None,
        });
        doc.leadership.push(LeadershipPost {
            id: 1,
            post: "LEADER (L)".into(),
            holder: "HARSH MALLIK".into(),
            status: classboard_model::PostStatus::Active,
            veto_quota: 5,
            tenure_months: 2,
            since_month: Some("2026-02".into()),
            updated_at: None,
        });
        doc
    }

    #[test]
    fn leader_grants_span_tenure_months() {
        let mut doc = document();
        recompute_veto_ledger(&mut doc);
        assert_eq!(doc.role_veto_monthly["2026-02"]["EA25D20"], 5);
        assert_eq!(doc.role_veto_monthly["2026-03"]["EA25D20"], 5);
        assert!(!doc.role_veto_monthly.contains_key("2026-04"));
    }

    #[test]
    fn recompute_replaces_stale_entries() {
        let mut doc = document();
        doc.role_veto_monthly
            .entry("1999-01".into())
            .or_default()
            .insert("GHOST".into(), 99);
        recompute_veto_ledger(&mut doc);
        assert!(!doc.role_veto_monthly.contains_key("1999-01"));
    }

    #[test]
    fn unmatched_holder_is_skipped() {
        let mut doc = document();
        doc.leadership[0].holder = "NOBODY KNOWN".into();
        recompute_veto_ledger(&mut doc);
        assert!(doc.role_veto_monthly.is_empty());
    }

    #[test]
    fn month_arithmetic_wraps_years() {
        assert_eq!(add_months("2026-11", 0).as_deref(), Some("2026-11"));
        assert_eq!(add_months("2026-11", 2).as_deref(), Some("2027-01"));
        assert_eq!(add_months("2026-13", 1), None);
    }
}
