//! Output collaborators for emissions and rejections

use super::config::OutputFormat;
use crate::aggregation::Emission;
use crate::error::Result;
use crate::record::Rejection;
use std::io::Write;
use tracing::warn;

/// Receives everything the pipeline produces
pub trait RecordSink {
    /// Called once per closed minute
    fn on_emit(&mut self, emission: &Emission) -> Result<()>;

    /// Called once per dropped record
    fn on_reject(&mut self, rejection: &Rejection) -> Result<()> {
        warn!(kind = rejection.kind.as_str(), record = %rejection.raw, "{}", rejection);
        Ok(())
    }

    /// Get sink name for logging
    fn name(&self) -> &str {
        "RecordSink"
    }
}

/// Writes emissions to any [`Write`], one per line; rejections go to the log
pub struct ConsoleSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> ConsoleSink<W> {
    /// Sink writing to `writer` in `format`
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Take back the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for ConsoleSink<W> {
    fn on_emit(&mut self, emission: &Emission) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{}", emission)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, emission)?;
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ConsoleSink"
    }
}

/// Keeps everything in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Emissions in the order they were produced
    pub emissions: Vec<Emission>,
    /// Rejections in the order they were produced
    pub rejections: Vec<Rejection>,
}

impl CollectingSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for CollectingSink {
    fn on_emit(&mut self, emission: &Emission) -> Result<()> {
        self.emissions.push(emission.clone());
        Ok(())
    }

    fn on_reject(&mut self, rejection: &Rejection) -> Result<()> {
        self.rejections.push(rejection.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "CollectingSink"
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn on_emit(&mut self, emission: &Emission) -> Result<()> {
        (**self).on_emit(emission)
    }

    fn on_reject(&mut self, rejection: &Rejection) -> Result<()> {
        (**self).on_reject(rejection)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
