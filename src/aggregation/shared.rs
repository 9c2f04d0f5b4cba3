use super::{AggregatorConfig, AggregatorStatistics, Emission, IngestOutcome, WindowedAggregator};
use crate::record::ParsedRecord;
use parking_lot::Mutex;

/// Aggregator that several producers can feed at once
///
/// Each [`offer`](Self::offer) takes the lock once and runs ingest and tick
/// inside it, so a minute can never be created twice or emitted twice.
#[derive(Debug)]
pub struct SharedAggregator {
    inner: Mutex<WindowedAggregator>,
}

impl SharedAggregator {
    /// Create a shared aggregator from a configuration
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            inner: Mutex::new(WindowedAggregator::with_config(config)),
        }
    }

    /// Ingest a validated record and tick at its timestamp
    pub fn offer(&self, record: &ParsedRecord) -> IngestOutcome {
        self.inner.lock().offer(record)
    }

    /// Emit every open minute
    pub fn flush(&self) -> Vec<Emission> {
        self.inner.lock().flush()
    }

    /// Counters since creation
    pub fn statistics(&self) -> AggregatorStatistics {
        self.inner.lock().statistics()
    }

    /// Take back the plain aggregator
    pub fn into_inner(self) -> WindowedAggregator {
        self.inner.into_inner()
    }
}

impl From<WindowedAggregator> for SharedAggregator {
    fn from(aggregator: WindowedAggregator) -> Self {
        Self {
            inner: Mutex::new(aggregator),
        }
    }
}
