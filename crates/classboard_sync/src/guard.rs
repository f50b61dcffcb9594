//! Corruption detection around the merge engine.
//!
//! Three advisory checks, none of which replaces the merge path: a
//! recovered or healed document still flows through the normal merge
//! before being persisted.

use crate::error::{SyncError, SyncResult};
use classboard_model::{ScoreboardDocument, Timestamp};

/// Thresholds for the corruption guard.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// A non-empty roster below this is treated as corrupt.
    pub min_roster: usize,
    /// Missing at least this many previously-known rolls marks a write
    /// suspicious (together with the shrink condition).
    pub missing_roll_threshold: usize,
    /// Slack on net shrink before a write is suspicious, distinguishing
    /// a legitimate small correction from a full-roster downgrade.
    pub shrink_slack: usize,
    /// A peer clock must lead the local clock by at least this many
    /// seconds before healing adopts it, to avoid clock-skew thrashing.
    pub heal_margin_secs: i64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_roster: 25,
            missing_roll_threshold: 8,
            shrink_slack: 3,
            heal_margin_secs: 120,
        }
    }
}

/// Screens documents before they are served or persisted.
#[derive(Debug, Clone, Default)]
pub struct CorruptionGuard {
    config: GuardConfig,
}

impl CorruptionGuard {
    /// Creates a guard with the given thresholds.
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// The configured thresholds.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Tiny-roster check: a non-empty student collection below the
    /// configured minimum is implausible. An empty collection is a fresh
    /// install, not corruption.
    pub fn is_implausible(&self, document: &ScoreboardDocument) -> bool {
        let count = document.student_count();
        count > 0 && count < self.config.min_roster
    }

    /// Read-side check; corrupt documents are refused rather than served.
    pub fn check_readable(&self, document: &ScoreboardDocument) -> SyncResult<()> {
        if self.is_implausible(document) {
            return Err(SyncError::CorruptState);
        }
        Ok(())
    }

    /// Write-side checks for a full-document push.
    ///
    /// Rejects the payload when its own roster is implausibly small, or
    /// when it is both missing many previously-known rolls *and* smaller
    /// than the stored roster by more than the slack margin.
    pub fn check_write(
        &self,
        stored: &ScoreboardDocument,
        incoming: &ScoreboardDocument,
    ) -> SyncResult<()> {
        if incoming.students.is_empty() {
            // Nothing roster-shaped to damage.
            return Ok(());
        }
        if self.is_implausible(incoming) && !stored.students.is_empty() {
            return Err(SyncError::PayloadTooSmall {
                student_count: incoming.student_count(),
                minimum: self.config.min_roster,
            });
        }

        let stored_rolls = stored.roll_set();
        let incoming_rolls = incoming.roll_set();
        let missing = stored_rolls.difference(&incoming_rolls).count();
        let shrinks_past_slack =
            incoming_rolls.len() + self.config.shrink_slack < stored_rolls.len();
        if missing >= self.config.missing_roll_threshold && shrinks_past_slack {
            tracing::warn!(
                missing,
                stored = stored_rolls.len(),
                incoming = incoming_rolls.len(),
                "rejecting suspicious roster shrink"
            );
            return Err(SyncError::PayloadTooSmall {
                student_count: incoming_rolls.len(),
                minimum: stored_rolls.len() - self.config.shrink_slack,
            });
        }
        Ok(())
    }

    /// Stale-snapshot healing: adopt a peer document only when its clock
    /// leads the local one by more than the configured margin.
    pub fn should_adopt_peer(
        &self,
        local: Option<Timestamp>,
        peer: Option<Timestamp>,
    ) -> bool {
        match (local, peer) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(local), Some(peer)) => {
                peer.seconds_since(&local) > self.config.heal_margin_secs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classboard_model::Student;

    fn document(count: usize) -> ScoreboardDocument {
        let mut doc = ScoreboardDocument::default();
        for i in 0..count {
            doc.students.push(Student {
                id: i as i64 + 1,
                roll: format!("EA24A{:02}", i + 1),
                name: format!("S{}", i + 1),
                base_name: format!("S{}", i + 1),
                class: 4,
                group: "A".into(),
                fees: 0,
                vote_power: 1,
                stars: 0,
                vetos: 0,
                active: true,
                created_at: None,
                updated_at: None,
            });
        }
        doc
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn tiny_roster_is_implausible_but_empty_is_not() {
        let guard = CorruptionGuard::default();
        assert!(guard.is_implausible(&document(10)));
        assert!(!guard.is_implausible(&document(0)));
        assert!(!guard.is_implausible(&document(46)));
        assert!(guard.check_readable(&document(10)).is_err());
    }

    #[test]
    fn full_roster_downgrade_is_rejected() {
        let guard = CorruptionGuard::default();
        let stored = document(46);
        let incoming = document(30);
        // 16 missing rolls, shrink of 16 > slack 3.
        let err = guard.check_write(&stored, &incoming).unwrap_err();
        assert!(matches!(err, SyncError::PayloadTooSmall { .. }));
    }

    #[test]
    fn small_incremental_correction_passes() {
        let guard = CorruptionGuard::default();
        let stored = document(46);
        let incoming = document(44);
        // Only 2 rolls missing: under the missing threshold.
        assert!(guard.check_write(&stored, &incoming).is_ok());
    }

    #[test]
    fn disjoint_but_equal_size_roster_passes_shrink_check() {
        let guard = CorruptionGuard::default();
        let stored = document(46);
        let mut incoming = document(46);
        for (i, s) in incoming.students.iter_mut().enumerate() {
            s.roll = format!("EA25Z{:02}", i + 1);
        }
        // Many missing rolls but no net shrink: not a downgrade.
        assert!(guard.check_write(&stored, &incoming).is_ok());
    }

    #[test]
    fn empty_patch_is_never_suspicious() {
        let guard = CorruptionGuard::default();
        let stored = document(46);
        assert!(guard.check_write(&stored, &document(0)).is_ok());
    }

    #[test]
    fn healing_requires_a_clear_margin() {
        let guard = CorruptionGuard::default();
        let local = ts("2026-02-03T10:00:00+05:30");
        let skewed = ts("2026-02-03T10:01:00+05:30");
        let clearly_newer = ts("2026-02-03T10:05:00+05:30");
        assert!(!guard.should_adopt_peer(Some(local), Some(skewed)));
        assert!(guard.should_adopt_peer(Some(local), Some(clearly_newer)));
        assert!(guard.should_adopt_peer(None, Some(local)));
        assert!(!guard.should_adopt_peer(Some(local), None));
    }
}
