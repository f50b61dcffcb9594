//! The default merge tie-break.

use classboard_model::Timestamp;

/// Which input side a merge decision selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Keep the already-stored item.
    Existing,
    /// Take the incoming item.
    Incoming,
}

/// Default tie-break: later timestamp wins wholesale; exact tie falls back
/// to the higher local-sequence id; if ids also tie, the existing side is
/// kept so re-applying the same merge is a no-op.
///
/// Callers are expected to backfill missing timestamps from `created_at`
/// or the document clock first. When only one side carries a timestamp it
/// wins; when neither does, ids decide.
pub fn pick_newer(
    existing_ts: Option<Timestamp>,
    existing_id: i64,
    incoming_ts: Option<Timestamp>,
    incoming_id: i64,
) -> Side {
    match (existing_ts, incoming_ts) {
        (Some(a), Some(b)) => {
            if b > a {
                Side::Incoming
            } else if a > b {
                Side::Existing
            } else if incoming_id > existing_id {
                Side::Incoming
            } else {
                Side::Existing
            }
        }
        (None, Some(_)) => Side::Incoming,
        (Some(_), None) => Side::Existing,
        (None, None) => {
            if incoming_id > existing_id {
                Side::Incoming
            } else {
                Side::Existing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn later_timestamp_wins() {
        let a = ts("2026-02-02T10:00:00+05:30");
        let b = ts("2026-02-02T10:00:01+05:30");
        assert_eq!(pick_newer(Some(a), 1, Some(b), 2), Side::Incoming);
        assert_eq!(pick_newer(Some(b), 1, Some(a), 2), Side::Existing);
    }

    #[test]
    fn tie_falls_back_to_higher_id() {
        let a = ts("2026-02-02T10:00:00+05:30");
        assert_eq!(pick_newer(Some(a), 1, Some(a), 2), Side::Incoming);
        assert_eq!(pick_newer(Some(a), 2, Some(a), 1), Side::Existing);
    }

    #[test]
    fn full_tie_keeps_existing() {
        let a = ts("2026-02-02T10:00:00+05:30");
        assert_eq!(pick_newer(Some(a), 3, Some(a), 3), Side::Existing);
        assert_eq!(pick_newer(None, 3, None, 3), Side::Existing);
    }

    #[test]
    fn present_timestamp_beats_absent() {
        let a = ts("2026-02-02T10:00:00+05:30");
        assert_eq!(pick_newer(None, 9, Some(a), 1), Side::Incoming);
        assert_eq!(pick_newer(Some(a), 1, None, 9), Side::Existing);
    }
}
