//! Pipeline configuration structures

use crate::aggregation::AggregatorConfig;
use crate::error::{ErrorContext, Result, RollupError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How input lines are turned into raw records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    /// Fields separated by a single delimiter character
    #[default]
    Delimited,
    /// One JSON array per line
    Json,
}

/// How emissions are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `<minute>: Average = <mean>`
    #[default]
    Text,
    /// One JSON object per emission
    Json,
}

/// Stream pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Windowed aggregator settings
    pub aggregator: AggregatorConfig,

    /// Emit minutes still open when the stream ends
    pub flush_on_end: bool,

    /// Input line format
    pub input_format: InputFormat,

    /// Field separator for delimited input
    pub delimiter: char,

    /// Emission output format
    pub output_format: OutputFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            aggregator: AggregatorConfig::default(),
            flush_on_end: false,
            input_format: InputFormat::Delimited,
            delimiter: ',',
            output_format: OutputFormat::Text,
        }
    }
}

impl PipelineConfig {
    /// Create a config builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(RollupError::from)
            .context(format!("reading {}", path.display()))?;
        Self::from_yaml_str(&yaml).context(format!("loading {}", path.display()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.aggregator.validate()?;

        if self.input_format == InputFormat::Delimited && delimiter_conflicts(self.delimiter) {
            return Err(RollupError::Configuration(format!(
                "delimiter {:?} can appear inside timestamps or values",
                self.delimiter
            )));
        }

        Ok(())
    }
}

/// Characters that a well-formed timestamp or number may contain
fn delimiter_conflicts(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '+' | ':' | '.')
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the aggregator settings
    pub fn aggregator(mut self, aggregator: AggregatorConfig) -> Self {
        self.config.aggregator = aggregator;
        self
    }

    /// Set the buffer window in minutes
    pub fn buffer_minutes(mut self, minutes: u32) -> Self {
        self.config.aggregator.buffer_minutes = minutes;
        self
    }

    /// Emit trailing open minutes at stream end
    pub fn flush_on_end(mut self, flush: bool) -> Self {
        self.config.flush_on_end = flush;
        self
    }

    /// How input lines are decoded
    pub fn input_format(mut self, format: InputFormat) -> Self {
        self.config.input_format = format;
        self
    }

    /// Field separator for delimited input
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// How emissions are written
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Build the configuration, validating it
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::ReferenceClock;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.aggregator.buffer_minutes, 5);
        assert!(!config.flush_on_end);
        assert_eq!(config.delimiter, ',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
aggregator:
  buffer_minutes: 10
  reference_clock: latest-record
flush_on_end: true
input_format: json
output_format: json
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.aggregator.buffer_minutes, 10);
        assert_eq!(config.aggregator.reference_clock, ReferenceClock::LatestRecord);
        assert_eq!(config.aggregator.emitted_history_limit, 10_000);
        assert!(config.flush_on_end);
        assert_eq!(config.input_format, InputFormat::Json);
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_yaml_rejects_unknown_clock() {
        let yaml = "aggregator:\n  reference_clock: wall-clock\n";
        assert!(matches!(
            PipelineConfig::from_yaml_str(yaml),
            Err(RollupError::YamlParse(_))
        ));
    }

    #[test]
    fn test_builder_validates() {
        assert!(PipelineConfig::builder().delimiter('\t').build().is_ok());
        assert!(PipelineConfig::builder().delimiter(' ').build().is_err());
        assert!(PipelineConfig::builder().delimiter(':').build().is_err());
        assert!(PipelineConfig::builder().buffer_minutes(0).build().is_err());

        // delimiter is irrelevant for JSON input
        assert!(PipelineConfig::builder()
            .input_format(InputFormat::Json)
            .delimiter(' ')
            .build()
            .is_ok());
    }
}
