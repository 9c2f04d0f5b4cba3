use super::{AggregatorConfig, AggregatorStatistics, Emission, IngestOutcome, ReferenceClock};
use crate::record::{MinuteKey, ParsedRecord};
use chrono::{Duration, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, trace};

/// Groups values by minute and emits each minute's mean once it falls
/// behind the buffer window
///
/// Closure is pull-based: nothing is emitted until [`tick`](Self::tick) is
/// called, normally once per record. If the stream goes quiet the trailing
/// minutes stay open until more data arrives or [`flush`](Self::flush) is
/// called.
#[derive(Debug)]
pub struct WindowedAggregator {
    config: AggregatorConfig,
    /// Open minutes, ordered so closure is a range split
    buckets: BTreeMap<MinuteKey, Vec<f64>>,
    /// Minutes already emitted
    emitted: BTreeSet<MinuteKey>,
    /// Same minutes in the order they were emitted, for bounding the history
    emitted_order: VecDeque<MinuteKey>,
    /// Time the last tick measured the cutoff from
    reference: Option<NaiveDateTime>,
    stats: AggregatorStatistics,
}

impl WindowedAggregator {
    /// Create an aggregator with the default five minute buffer
    pub fn new() -> Self {
        Self::with_config(AggregatorConfig::default())
    }

    /// Create an aggregator from an explicit configuration
    pub fn with_config(config: AggregatorConfig) -> Self {
        Self {
            config,
            buckets: BTreeMap::new(),
            emitted: BTreeSet::new(),
            emitted_order: VecDeque::new(),
            reference: None,
            stats: AggregatorStatistics::default(),
        }
    }

    /// Add `value` to the bucket for `key`, creating the bucket if needed
    ///
    /// Returns `false` and discards the value when `key` has already been
    /// emitted; an emitted minute is never reopened.
    pub fn ingest(&mut self, key: MinuteKey, value: f64) -> bool {
        if self.emitted.contains(&key) {
            debug!(minute = %key, value, "dropping value for emitted minute");
            self.stats.late_dropped += 1;
            return false;
        }

        self.buckets.entry(key).or_default().push(value);
        self.stats.ingested += 1;
        trace!(minute = %key, value, open = self.buckets.len(), "ingested");
        true
    }

    /// Emit and evict every minute strictly earlier than the cutoff
    ///
    /// `now` is the event time of the record just processed. The cutoff is
    /// measured from it, or from the greatest time seen so far, depending on
    /// the configured [`ReferenceClock`]. Emissions come back in minute order.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Emission> {
        let reference = match (self.config.reference_clock, self.reference) {
            (ReferenceClock::MaxObserved, Some(previous)) => previous.max(now),
            _ => now,
        };
        self.reference = Some(reference);

        match reference.checked_sub_signed(self.config.buffer()) {
            Some(cutoff) => self.close_before(cutoff),
            None => Vec::new(),
        }
    }

    /// Ingest a validated record, then tick at its timestamp
    pub fn offer(&mut self, record: &ParsedRecord) -> IngestOutcome {
        let accepted = self.ingest(record.key, record.value);
        let emissions = self.tick(record.timestamp);
        IngestOutcome {
            accepted,
            emissions,
        }
    }

    /// Emit every open minute regardless of the cutoff
    pub fn flush(&mut self) -> Vec<Emission> {
        let open = std::mem::take(&mut self.buckets);
        if !open.is_empty() {
            debug!(buckets = open.len(), "flushing open minutes");
        }
        open.into_iter()
            .map(|(key, values)| self.emit(key, values))
            .collect()
    }

    /// Current cutoff, if any tick has happened
    pub fn cutoff(&self) -> Option<NaiveDateTime> {
        self.reference
            .and_then(|reference| reference.checked_sub_signed(self.config.buffer()))
    }

    /// Reference time of the last tick
    pub fn reference(&self) -> Option<NaiveDateTime> {
        self.reference
    }

    /// Whether `key` has an open bucket
    pub fn is_open(&self, key: &MinuteKey) -> bool {
        self.buckets.contains_key(key)
    }

    /// Whether `key` has been emitted and is still remembered as such
    pub fn is_emitted(&self, key: &MinuteKey) -> bool {
        self.emitted.contains(key)
    }

    /// Open minutes in ascending order
    pub fn open_keys(&self) -> impl Iterator<Item = &MinuteKey> + '_ {
        self.buckets.keys()
    }

    /// Number of open minutes
    pub fn open_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Aggregator configuration
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Counters since creation
    pub fn statistics(&self) -> AggregatorStatistics {
        AggregatorStatistics {
            open_buckets: self.buckets.len(),
            ..self.stats
        }
    }

    fn close_before(&mut self, cutoff: NaiveDateTime) -> Vec<Emission> {
        let still_open = match first_open_key(cutoff) {
            Some(first) => self.buckets.split_off(&first),
            None => BTreeMap::new(),
        };
        let closed = std::mem::replace(&mut self.buckets, still_open);

        closed
            .into_iter()
            .map(|(key, values)| self.emit(key, values))
            .collect()
    }

    fn emit(&mut self, key: MinuteKey, values: Vec<f64>) -> Emission {
        let emission = Emission {
            minute: key,
            average: mean(&values),
            count: values.len(),
        };

        if self.emitted.insert(key) {
            self.emitted_order.push_back(key);
        }
        while self.emitted_order.len() > self.config.emitted_history_limit {
            if let Some(forgotten) = self.emitted_order.pop_front() {
                self.emitted.remove(&forgotten);
            }
        }
        self.stats.emitted += 1;

        debug!(minute = %key, average = emission.average, count = emission.count, "emitting minute");
        emission
    }
}

impl Default for WindowedAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest minute that is not strictly earlier than `cutoff`
///
/// Keys are minute-aligned, so `key < cutoff` exactly when
/// `key < first_open_key(cutoff)`.
fn first_open_key(cutoff: NaiveDateTime) -> Option<MinuteKey> {
    let floor = MinuteKey::truncate(cutoff);
    if floor.start() == cutoff {
        return Some(floor);
    }
    floor
        .start()
        .checked_add_signed(Duration::minutes(1))
        .map(MinuteKey::truncate)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
