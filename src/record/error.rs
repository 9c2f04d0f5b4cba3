use super::RawRecord;
use serde::Serialize;
use thiserror::Error;

/// Why a record was dropped from the stream
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionKind {
    /// Record is missing or does not have exactly two fields
    #[error("malformed record shape")]
    MalformedShape,

    /// Timestamp text is not `YYYY-MM-DD HH:MM:SS`
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// Value text is not a finite decimal number
    #[error("invalid value")]
    InvalidValue,

    /// Record belongs to a minute that has already been emitted
    #[error("late record for an emitted minute")]
    LateRecord,
}

impl RejectionKind {
    /// Every kind, in reporting order
    pub const ALL: [RejectionKind; 4] = [
        RejectionKind::MalformedShape,
        RejectionKind::InvalidTimestamp,
        RejectionKind::InvalidValue,
        RejectionKind::LateRecord,
    ];

    /// Stable label used in logs and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::MalformedShape => "malformed-shape",
            RejectionKind::InvalidTimestamp => "invalid-timestamp",
            RejectionKind::InvalidValue => "invalid-value",
            RejectionKind::LateRecord => "late-record",
        }
    }
}

/// A dropped record together with the reason it was dropped
#[derive(Debug, Error, Clone, PartialEq)]
#[error("skipping record {raw}: {kind}")]
pub struct Rejection {
    /// Classification of the problem
    pub kind: RejectionKind,
    /// The record exactly as it was received
    pub raw: RawRecord,
}

impl Rejection {
    /// Create a rejection for `raw`
    pub fn new(kind: RejectionKind, raw: RawRecord) -> Self {
        Self { kind, raw }
    }
}
