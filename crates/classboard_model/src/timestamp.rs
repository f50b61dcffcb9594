//! Timezone-aware timestamps and the document logical clock.
//!
//! Every timestamp in the document is RFC 3339 with an explicit offset.
//! The document-level `server_updated_at` is the logical clock used for
//! top-level accept/reject decisions; item-level `updated_at`/`created_at`
//! drive per-item merge tie-breaks.

use crate::error::{ModelError, ModelResult};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default server UTC offset in seconds (+05:30).
const DEFAULT_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// An RFC 3339 timestamp with an explicit UTC offset.
///
/// Ordering compares instants, not wall-clock strings, so two timestamps
/// written in different offsets still order correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// Parses an RFC 3339 string.
    pub fn parse(value: &str) -> ModelResult<Self> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(Self)
            .map_err(|_| ModelError::InvalidTimestamp {
                value: value.to_string(),
            })
    }

    /// The current time in the given offset.
    pub fn now(offset: FixedOffset) -> Self {
        Self(Utc::now().with_timezone(&offset))
    }

    /// Wraps an already-constructed chrono value.
    pub fn from_datetime(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }

    /// The underlying chrono value.
    pub fn as_datetime(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// Serializes back to RFC 3339.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// The "YYYY-MM" month key this instant falls in, in its own offset.
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.0.year(), self.0.month())
    }

    /// Seconds from `other` to `self` (positive when `self` is later).
    pub fn seconds_since(&self, other: &Timestamp) -> i64 {
        self.0.signed_duration_since(other.0).num_seconds()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Timestamp::parse(&value).map_err(D::Error::custom)
    }
}

/// The "YYYY-MM" key for a calendar date.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Parses a UTC offset of the form `+05:30`, `-03:00` or `+0530`.
pub fn parse_utc_offset(value: &str) -> ModelResult<FixedOffset> {
    let value = value.trim();
    let err = || ModelError::InvalidUtcOffset {
        value: value.to_string(),
    };

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1i32, &value[1..]),
        Some(b'-') => (-1i32, &value[1..]),
        _ => return Err(err()),
    };

    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return Err(err());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| err())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| err())?;
    if hours > 23 || minutes > 59 {
        return Err(err());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
}

/// Clock configuration shared across the engine.
///
/// A fixed offset rather than a named zone: the deployment target is a
/// single LAN in one offset, and no DST transitions apply.
#[derive(Debug, Clone, Copy)]
pub struct ClockConfig {
    offset: FixedOffset,
}

impl ClockConfig {
    /// Creates a clock with the given offset.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parses the offset from a string such as `+05:30`.
    pub fn from_offset_str(value: &str) -> ModelResult<Self> {
        Ok(Self::new(parse_utc_offset(value)?))
    }

    /// The configured offset.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The current time in the configured offset.
    pub fn now(&self) -> Timestamp {
        Timestamp::now(self.offset)
    }

    /// The current "YYYY-MM" month key.
    pub fn current_month(&self) -> String {
        self.now().month_key()
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(DEFAULT_OFFSET_SECONDS)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self { offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_roundtrip() {
        let ts = Timestamp::parse("2026-02-03T10:15:00+05:30").unwrap();
        assert_eq!(ts.month_key(), "2026-02");
        let again = Timestamp::parse(&ts.to_rfc3339()).unwrap();
        assert_eq!(ts, again);
    }

    #[test]
    fn ordering_compares_instants() {
        // Same instant, expressed in two offsets.
        let a = Timestamp::parse("2026-02-03T10:00:00+05:30").unwrap();
        let b = Timestamp::parse("2026-02-03T04:30:00+00:00").unwrap();
        assert_eq!(a, b);

        let later = Timestamp::parse("2026-02-03T10:00:01+05:30").unwrap();
        assert!(later > a);
        assert_eq!(later.seconds_since(&a), 1);
    }

    #[test]
    fn reject_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn serde_as_string() {
        let ts = Timestamp::parse("2026-02-03T10:15:00+05:30").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2026-02-03T10:15:00+05:30\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn offset_parsing() {
        assert_eq!(
            parse_utc_offset("+05:30").unwrap().local_minus_utc(),
            19800
        );
        assert_eq!(parse_utc_offset("-0300").unwrap().local_minus_utc(), -10800);
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+99:99").is_err());
    }

    #[test]
    fn default_clock_is_ist() {
        let clock = ClockConfig::default();
        assert_eq!(clock.offset().local_minus_utc(), 19800);
    }

    #[test]
    fn month_key_for_date() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert_eq!(month_key(d), "2026-02");
    }
}
