//! Line decoding for delimited and JSON input

use super::config::{InputFormat, PipelineConfig};
use crate::record::RawRecord;
use serde_json::Value;

/// Turns one input line into a raw record
#[derive(Debug, Clone, Copy)]
pub struct LineDecoder {
    format: InputFormat,
    delimiter: char,
}

impl LineDecoder {
    /// Create a decoder
    pub fn new(format: InputFormat, delimiter: char) -> Self {
        Self { format, delimiter }
    }

    /// Decoder matching a pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.input_format, config.delimiter)
    }

    /// Decode a line; blank lines yield `None`
    ///
    /// Decoding never fails. Lines that cannot be read as a record come back
    /// as a single-field record so the parser reports them as
    /// `malformed-shape` with the original text attached.
    pub fn decode(&self, line: &str) -> Option<RawRecord> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let record = match self.format {
            InputFormat::Delimited => RawRecord::new(line.split(self.delimiter)),
            InputFormat::Json => decode_json(line),
        };
        Some(record)
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(InputFormat::Delimited, ',')
    }
}

fn decode_json(line: &str) -> RawRecord {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Null) => RawRecord::null(),
        Ok(Value::Array(items)) => {
            let fields: Option<Vec<String>> = items.iter().map(json_field).collect();
            fields.map(RawRecord::new).unwrap_or_else(RawRecord::null)
        }
        _ => RawRecord::new([line]),
    }
}

/// Text of one array element; `None` for a null element
fn json_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
