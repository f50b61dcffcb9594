//! Fee records and payment evidence.

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// A single payment event.
///
/// Payments are evidence: once recorded anywhere they must survive every
/// merge. The fingerprint `(date, amount, note)` deduplicates entries that
/// arrive via more than one peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeePayment {
    /// Payment date as "YYYY-MM-DD".
    #[serde(default)]
    pub date: String,
    /// Amount paid.
    #[serde(default)]
    pub amount: i64,
    /// Free-text note.
    #[serde(default)]
    pub note: String,
}

impl FeePayment {
    /// Deduplication fingerprint.
    pub fn fingerprint(&self) -> (String, i64, String) {
        (
            normalize_payment_date(&self.date),
            self.amount,
            self.note.trim().to_lowercase(),
        )
    }
}

/// Keeps only the leading "YYYY-MM-DD" when the value looks like a date.
pub(crate) fn normalize_payment_date(value: &str) -> String {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() >= 10 && bytes[4] == b'-' && bytes[7] == b'-' {
        value[..10].to_string()
    } else {
        value.to_string()
    }
}

/// Fee state for one student. Identity is the student's local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRecord {
    /// Owning student's local id.
    #[serde(rename = "studentId")]
    pub student_id: i64,
    /// Append-only payment evidence.
    #[serde(default)]
    pub payment_history: Vec<FeePayment>,
    /// Latest payment date, monotonically non-shrinking across merges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_paid_date: Option<String>,
    /// Advisory remarks (newest-wins).
    #[serde(default)]
    pub remarks: String,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl FeeRecord {
    /// Sorts history by date and drops duplicate fingerprints.
    pub fn normalize(&mut self) {
        let mut seen = std::collections::BTreeSet::new();
        self.payment_history
            .retain(|p| seen.insert(p.fingerprint()));
        self.payment_history
            .sort_by_key(|p| normalize_payment_date(&p.date));
        if let Some(last) = &mut self.last_paid_date {
            *last = normalize_payment_date(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(date: &str, amount: i64) -> FeePayment {
        FeePayment {
            date: date.into(),
            amount,
            note: String::new(),
        }
    }

    #[test]
    fn duplicate_payments_collapse() {
        let mut rec = FeeRecord {
            student_id: 9,
            payment_history: vec![
                payment("2026-02-01", 500),
                payment("2026-01-05", 300),
                payment("2026-02-01", 500),
            ],
            last_paid_date: Some("2026-02-01T10:00:00".into()),
            remarks: String::new(),
            updated_at: None,
        };
        rec.normalize();
        assert_eq!(rec.payment_history.len(), 2);
        assert_eq!(rec.payment_history[0].date, "2026-01-05");
        assert_eq!(rec.last_paid_date.as_deref(), Some("2026-02-01"));
    }

    #[test]
    fn fingerprint_ignores_note_case() {
        let a = FeePayment {
            date: "2026-02-01".into(),
            amount: 500,
            note: "Cash".into(),
        };
        let b = FeePayment {
            date: "2026-02-01T09:00:00".into(),
            amount: 500,
            note: "cash ".into(),
        };
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
