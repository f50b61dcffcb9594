//! Month roster merge.

use std::collections::{BTreeMap, BTreeSet};

/// Unions known rolls per month across peers.
///
/// Always a set union: a partial incoming payload must never shrink the
/// known roster for a month.
pub fn merge_month_rosters(
    existing: &BTreeMap<String, BTreeSet<String>>,
    incoming: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut merged = existing.clone();
    for (month, rolls) in incoming {
        merged
            .entry(month.clone())
            .or_default()
            .extend(rolls.iter().cloned());
    }
    merged
}
