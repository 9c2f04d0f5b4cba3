use crate::record::MinuteKey;
use serde::Serialize;
use std::fmt;

/// Minute-bucketed windowed aggregation
pub mod window;
/// Mutex-guarded aggregator for concurrent producers
pub mod shared;
/// Configuration types for aggregation
pub mod config;

pub use config::{AggregatorConfig, ReferenceClock};
pub use shared::SharedAggregator;
pub use window::WindowedAggregator;

/// A closed minute and the mean of its values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emission {
    /// Minute the values belong to
    pub minute: MinuteKey,
    /// Arithmetic mean of the values
    pub average: f64,
    /// Number of values averaged
    pub count: usize,
}

impl fmt::Display for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Average = {:.6}", self.minute, self.average)
    }
}

/// Result of feeding one record to the aggregator
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestOutcome {
    /// False when the record's minute had already been emitted
    pub accepted: bool,
    /// Minutes closed by the tick that followed the record
    pub emissions: Vec<Emission>,
}

/// Statistics about the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregatorStatistics {
    /// Minutes currently open
    pub open_buckets: usize,
    /// Values added to a bucket
    pub ingested: u64,
    /// Values discarded because their minute was already emitted
    pub late_dropped: u64,
    /// Minutes emitted so far
    pub emitted: u64,
}
