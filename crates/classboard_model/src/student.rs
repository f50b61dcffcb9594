//! Student records.

use crate::normalize::{normalize_roll, parse_name_meta};
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// A student on the shared roster.
///
/// Identity across peers is the roll code. The numeric `id` is local-only:
/// two peers may assign different ids to the same roll, so it must never be
/// trusted as global identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Local sequence id (not portable across peers).
    #[serde(default)]
    pub id: i64,
    /// Roll code, canonical after upper-casing.
    pub roll: String,
    /// Display name, possibly carrying star/veto markers.
    #[serde(default)]
    pub name: String,
    /// Base name with markers stripped, for cross-peer matching.
    #[serde(default)]
    pub base_name: String,
    /// Class (numeric grade).
    #[serde(default)]
    pub class: i64,
    /// Group letter.
    #[serde(default)]
    pub group: String,
    /// Fee commitment for the academic year.
    #[serde(default)]
    pub fees: i64,
    /// Voting power in class elections.
    #[serde(default)]
    pub vote_power: i64,
    /// Stars earned (derived from name markers on import, then maintained).
    #[serde(default)]
    pub stars: i64,
    /// Veto count (derived from name markers on import, then maintained).
    #[serde(default)]
    pub vetos: i64,
    /// Whether this record is logically active. Removal is modeled as
    /// `active:false`, never physical deletion.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

fn default_active() -> bool {
    true
}

impl Student {
    /// Normalizes roll, base name and marker-derived counters in place.
    ///
    /// Star/veto counters are only backfilled from name markers when the
    /// record carries none of its own, so an explicit counter from a peer
    /// is never overwritten by re-parsing the display name.
    pub fn normalize(&mut self) {
        self.roll = normalize_roll(&self.roll);
        let (base, stars, vetos) = parse_name_meta(&self.name);
        if self.base_name.trim().is_empty() {
            self.base_name = base;
        }
        if self.stars == 0 {
            self.stars = stars;
        }
        if self.vetos == 0 {
            self.vetos = vetos;
        }
    }

    /// The best available merge timestamp: `updated_at`, else `created_at`.
    pub fn merge_timestamp(&self) -> Option<Timestamp> {
        self.updated_at.or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(roll: &str, name: &str) -> Student {
        Student {
            id: 1,
            roll: roll.into(),
            name: name.into(),
            base_name: String::new(),
            class: 9,
            group: "D".into(),
            fees: 1500,
            vote_power: 3,
            stars: 0,
            vetos: 0,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn normalize_backfills_markers() {
        let mut s = student("ea25d20", "Harsh Mallik*** (v)");
        s.normalize();
        assert_eq!(s.roll, "EA25D20");
        assert_eq!(s.base_name, "Harsh Mallik");
        assert_eq!(s.stars, 3);
        assert_eq!(s.vetos, 1);
    }

    #[test]
    fn normalize_keeps_explicit_counters() {
        let mut s = student("EA25D20", "Harsh Mallik***");
        s.stars = 7;
        s.normalize();
        assert_eq!(s.stars, 7);
    }

    #[test]
    fn active_defaults_to_true() {
        let s: Student = serde_json::from_str(r#"{"roll":"EA24A01"}"#).unwrap();
        assert!(s.active);
        assert_eq!(s.id, 0);
    }

    #[test]
    fn merge_timestamp_prefers_updated() {
        let mut s = student("EA24A01", "X");
        assert!(s.merge_timestamp().is_none());
        s.created_at = Some(Timestamp::parse("2026-02-01T08:00:00+05:30").unwrap());
        s.updated_at = Some(Timestamp::parse("2026-02-02T08:00:00+05:30").unwrap());
        assert_eq!(s.merge_timestamp(), s.updated_at);
    }
}
