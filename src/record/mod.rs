//! Raw record validation and minute bucketing
//!
//! A raw record is whatever the source handed us: ideally a
//! `(timestamp, value)` pair of strings. [`parse_record`] turns it into a
//! [`ParsedRecord`] keyed by its [`MinuteKey`], or a [`Rejection`] saying why
//! it was dropped.

use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;

/// Rejection types
pub mod error;

pub use error::{Rejection, RejectionKind};

/// Canonical timestamp layout, 24-hour clock
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Record as received from the source, before any validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    fields: Option<Vec<String>>,
}

impl RawRecord {
    /// Record made of arbitrary fields
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Well-shaped `(timestamp, value)` record
    pub fn pair(timestamp: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            fields: Some(vec![timestamp.into(), value.into()]),
        }
    }

    /// Missing record
    pub fn null() -> Self {
        Self { fields: None }
    }

    /// Fields of the record, `None` when the record itself is missing
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }
}

impl fmt::Display for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fields {
            Some(fields) => write!(f, "[{}]", fields.join(", ")),
            None => f.write_str("null"),
        }
    }
}

/// Timestamp truncated to the start of its minute
///
/// Ordered by wall-clock time. Renders as `YYYY-MM-DD HH:MM:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteKey(NaiveDateTime);

impl MinuteKey {
    /// Drop seconds and everything finer
    pub fn truncate(timestamp: NaiveDateTime) -> Self {
        // hour and minute of a valid timestamp always form a valid time
        let minute = timestamp
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(timestamp);
        Self(minute)
    }

    /// Start of the minute
    pub fn start(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for MinuteKey {
    fn from(timestamp: NaiveDateTime) -> Self {
        Self::truncate(timestamp)
    }
}

impl fmt::Display for MinuteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for MinuteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRecord {
    /// Full-resolution event time
    pub timestamp: NaiveDateTime,
    /// Minute bucket the record belongs to
    pub key: MinuteKey,
    /// Observed value
    pub value: f64,
}

/// Parse a timestamp in [`TIMESTAMP_FORMAT`]
///
/// Surrounding whitespace is ignored and month, day, hour, minute and second
/// may drop their zero padding (`2025-02-10 5:47:10`). Everything else must
/// match exactly: a four digit year, a single space between date and time,
/// digits only, and no leap second.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, RejectionKind> {
    let text = text.trim();
    if !has_canonical_shape(text) {
        return Err(RejectionKind::InvalidTimestamp);
    }

    let timestamp = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|_| RejectionKind::InvalidTimestamp)?;
    // chrono encodes second 60 as an overflowing nanosecond
    if timestamp.nanosecond() >= 1_000_000_000 {
        return Err(RejectionKind::InvalidTimestamp);
    }
    Ok(timestamp)
}

/// `Y-M-D h:m:s` with a 4 digit year and 1 or 2 digits in every other field
fn has_canonical_shape(text: &str) -> bool {
    fn digits(field: &str, min: usize, max: usize) -> bool {
        (min..=max).contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit())
    }

    let Some((date, time)) = text.split_once(' ') else {
        return false;
    };
    let date: Vec<&str> = date.split('-').collect();
    let time: Vec<&str> = time.split(':').collect();

    matches!(date.as_slice(), [y, m, d] if digits(y, 4, 4) && digits(m, 1, 2) && digits(d, 1, 2))
        && matches!(time.as_slice(), [h, m, s] if digits(h, 1, 2) && digits(m, 1, 2) && digits(s, 1, 2))
}

/// Parse a finite decimal floating-point value
pub fn parse_value(text: &str) -> Result<f64, RejectionKind> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(RejectionKind::InvalidValue),
    }
}

/// Validate a raw record and assign it to its minute
pub fn parse_record(raw: &RawRecord) -> Result<ParsedRecord, Rejection> {
    let reject = |kind: RejectionKind| Rejection::new(kind, raw.clone());

    let (timestamp_text, value_text) = match raw.fields() {
        Some([timestamp, value]) => (timestamp, value),
        _ => return Err(reject(RejectionKind::MalformedShape)),
    };

    // value first: a record with both fields broken reports the number
    let value = parse_value(value_text).map_err(reject)?;
    let timestamp = parse_timestamp(timestamp_text).map_err(reject)?;

    Ok(ParsedRecord {
        timestamp,
        key: MinuteKey::truncate(timestamp),
        value,
    })
}
