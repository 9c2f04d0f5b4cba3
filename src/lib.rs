//! Minute-bucketed rolling averages over a stream of timestamped values
//!
//! Records arrive as `(timestamp, value)` text pairs. Each valid record is
//! assigned to the minute it occurred in; once that minute falls more than a
//! buffer window (five minutes by default) behind the stream's clock, the
//! mean of its values is emitted and the minute is forgotten. Malformed
//! records are dropped and reported, never fatal.
//!
//! # Example
//!
//! ```
//! use stream_rollup::aggregation::WindowedAggregator;
//! use stream_rollup::record::{parse_record, RawRecord};
//!
//! let mut aggregator = WindowedAggregator::new();
//!
//! for (ts, value) in [
//!     ("2025-02-10 05:38:00", "1.0"),
//!     ("2025-02-10 05:38:30", "2.0"),
//!     ("2025-02-10 05:44:00", "9.0"),
//! ] {
//!     let record = parse_record(&RawRecord::pair(ts, value)).unwrap();
//!     for emission in aggregator.offer(&record).emissions {
//!         // 2025-02-10 05:38:00: Average = 1.500000
//!         println!("{}", emission);
//!     }
//! }
//!
//! assert_eq!(aggregator.open_buckets(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Re-export commonly used items
pub use aggregation::{
    AggregatorConfig, Emission, IngestOutcome, ReferenceClock, SharedAggregator,
    WindowedAggregator,
};
pub use error::{Result, RollupError};
pub use pipeline::{PipelineConfig, RecordSink, StreamPipeline, StreamStatistics};
pub use record::{parse_record, MinuteKey, ParsedRecord, RawRecord, Rejection, RejectionKind};

/// Error types
pub mod error;

/// Record parsing and minute keys
pub mod record;

/// Windowed aggregation
pub mod aggregation;

/// Stream session wiring, input decoding and sinks
pub mod pipeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber
///
/// Filtering follows `RUST_LOG`, falling back to `default_level`. Logs are
/// written to stderr so stdout stays reserved for emissions.
pub fn init_tracing(json: bool, default_level: tracing::Level) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt).init();
    }
}
