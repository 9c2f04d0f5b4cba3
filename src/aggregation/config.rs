use crate::error::{Result, RollupError};
use serde::{Deserialize, Serialize};

/// Which record time drives bucket closure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceClock {
    /// Greatest event time observed so far; never moves backwards
    #[default]
    MaxObserved,
    /// Event time of the record just processed
    LatestRecord,
}

/// Configuration for the windowed aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// How long a minute stays open after it ends, in minutes
    pub buffer_minutes: u32,
    /// Time source for the closure cutoff
    pub reference_clock: ReferenceClock,
    /// Maximum number of emitted minutes remembered for late-record detection
    pub emitted_history_limit: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: 5,
            reference_clock: ReferenceClock::MaxObserved,
            emitted_history_limit: 10_000,
        }
    }
}

impl AggregatorConfig {
    /// Set the buffer window
    pub fn buffer_minutes(mut self, minutes: u32) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    /// Set the reference clock
    pub fn reference_clock(mut self, clock: ReferenceClock) -> Self {
        self.reference_clock = clock;
        self
    }

    /// Set how many emitted minutes are remembered
    pub fn emitted_history_limit(mut self, limit: usize) -> Self {
        self.emitted_history_limit = limit;
        self
    }

    /// Buffer window as a chrono duration
    pub fn buffer(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.buffer_minutes))
    }

    /// Check the configuration for values the aggregator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.buffer_minutes == 0 {
            return Err(RollupError::Configuration(
                "buffer_minutes must be at least 1".to_string(),
            ));
        }
        if self.emitted_history_limit == 0 {
            return Err(RollupError::Configuration(
                "emitted_history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AggregatorConfig::default();
        assert_eq!(config.buffer_minutes, 5);
        assert_eq!(config.reference_clock, ReferenceClock::MaxObserved);
        assert_eq!(config.buffer(), chrono::Duration::minutes(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(AggregatorConfig::default().buffer_minutes(0).validate().is_err());
        assert!(AggregatorConfig::default()
            .emitted_history_limit(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: AggregatorConfig =
            serde_yaml::from_str("reference_clock: latest-record\n").unwrap();
        assert_eq!(config.reference_clock, ReferenceClock::LatestRecord);
        assert_eq!(config.buffer_minutes, 5);
    }
}
