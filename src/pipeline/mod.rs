//! Record stream processing
//!
//! [`StreamPipeline`] wires the record parser to a [`WindowedAggregator`] and
//! forwards whatever comes out to a [`RecordSink`]:
//!
//! - every raw record is validated; failures are reported and dropped
//! - valid records are ingested and trigger one tick at their event time
//! - closed minutes are emitted to the sink in minute order
//!
//! # Example
//!
//! ```
//! use stream_rollup::pipeline::{CollectingSink, PipelineConfig, StreamPipeline};
//! use stream_rollup::record::RawRecord;
//!
//! # fn example() -> stream_rollup::Result<()> {
//! let config = PipelineConfig::builder().flush_on_end(true).build()?;
//! let mut pipeline = StreamPipeline::new(&config, CollectingSink::new())?;
//!
//! pipeline.process(RawRecord::pair("2025-02-10 05:47:10", "1.0"))?;
//! pipeline.process(RawRecord::pair("2025-02-10 05:47:40", "3.0"))?;
//! pipeline.process(RawRecord::pair("not a time", "2.0"))?;
//!
//! let (stats, sink) = pipeline.finish()?;
//! assert_eq!(sink.emissions.len(), 1);
//! assert_eq!(sink.emissions[0].average, 2.0);
//! assert_eq!(stats.rejected_total(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

/// Session configuration and YAML loading
pub mod config;
/// Line decoding for delimited and JSON input
pub mod input;
/// Emission and rejection collaborators
pub mod sink;

pub use config::{InputFormat, OutputFormat, PipelineConfig, PipelineConfigBuilder};
pub use input::LineDecoder;
pub use sink::{CollectingSink, ConsoleSink, RecordSink};

use crate::aggregation::{Emission, WindowedAggregator};
use crate::error::Result;
use crate::record::{parse_record, RawRecord, Rejection, RejectionKind};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Counters for one stream session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamStatistics {
    /// Raw records seen
    pub records: u64,
    /// Records added to a bucket
    pub accepted: u64,
    /// Dropped records by reason
    pub rejected: BTreeMap<RejectionKind, u64>,
    /// Minutes emitted, flushed ones included
    pub emitted: u64,
    /// Minutes emitted by the end-of-stream flush
    pub flushed: u64,
    /// Minutes left open (never emitted) when the session ended
    pub left_open: usize,
}

impl StreamStatistics {
    /// Total dropped records
    pub fn rejected_total(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// Dropped records of one kind
    pub fn rejected(&self, kind: RejectionKind) -> u64 {
        self.rejected.get(&kind).copied().unwrap_or(0)
    }
}

/// One stream session: parser, aggregator and output sink
pub struct StreamPipeline<S: RecordSink> {
    aggregator: WindowedAggregator,
    sink: S,
    flush_on_end: bool,
    stats: StreamStatistics,
}

impl<S: RecordSink> StreamPipeline<S> {
    /// Create a session; fails only on an invalid configuration
    pub fn new(config: &PipelineConfig, sink: S) -> Result<Self> {
        config.validate()?;
        debug!(sink = sink.name(), config = ?config, "starting stream session");
        Ok(Self {
            aggregator: WindowedAggregator::with_config(config.aggregator.clone()),
            sink,
            flush_on_end: config.flush_on_end,
            stats: StreamStatistics::default(),
        })
    }

    /// Process one raw record
    ///
    /// Bad records are reported to the sink and never fail the call; the
    /// only errors are the sink's own.
    pub fn process(&mut self, raw: RawRecord) -> Result<()> {
        self.stats.records += 1;

        let record = match parse_record(&raw) {
            Ok(record) => record,
            Err(rejection) => return self.reject(rejection),
        };

        let outcome = self.aggregator.offer(&record);
        if outcome.accepted {
            self.stats.accepted += 1;
        }

        // closed minutes are already gone from the aggregator
        self.emit_all(&outcome.emissions)?;
        if !outcome.accepted {
            self.reject(Rejection::new(RejectionKind::LateRecord, raw))?;
        }
        Ok(())
    }

    /// Process every record of a finite or infinite sequence
    pub fn run<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        for raw in records {
            self.process(raw)?;
        }
        Ok(())
    }

    /// End the session, flushing open minutes if configured
    pub fn finish(mut self) -> Result<(StreamStatistics, S)> {
        if self.flush_on_end {
            let flushed = self.aggregator.flush();
            self.stats.flushed = flushed.len() as u64;
            self.emit_all(&flushed)?;
        }
        self.stats.left_open = self.aggregator.open_buckets();

        info!(
            records = self.stats.records,
            accepted = self.stats.accepted,
            rejected = self.stats.rejected_total(),
            emitted = self.stats.emitted,
            flushed = self.stats.flushed,
            left_open = self.stats.left_open,
            "stream finished"
        );
        for (kind, count) in &self.stats.rejected {
            info!(kind = kind.as_str(), count, "rejected records");
        }

        Ok((self.stats, self.sink))
    }

    /// The session's aggregator
    pub fn aggregator(&self) -> &WindowedAggregator {
        &self.aggregator
    }

    /// Counters so far
    pub fn statistics(&self) -> &StreamStatistics {
        &self.stats
    }

    /// The session's sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn reject(&mut self, rejection: Rejection) -> Result<()> {
        *self.stats.rejected.entry(rejection.kind).or_default() += 1;
        self.sink.on_reject(&rejection)
    }

    fn emit_all(&mut self, emissions: &[Emission]) -> Result<()> {
        for emission in emissions {
            self.stats.emitted += 1;
            self.sink.on_emit(emission)?;
        }
        Ok(())
    }
}
