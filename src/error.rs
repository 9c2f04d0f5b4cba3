/// Error types for the rollup pipeline
use thiserror::Error;

/// Fatal errors raised outside the per-record path
///
/// Bad records never surface here; they are reported as
/// [`Rejection`](crate::record::Rejection)s and the stream keeps going.
#[derive(Error, Debug)]
pub enum RollupError {
    /// Configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// YAML parsing failed
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rollup operations
pub type Result<T> = std::result::Result<T, RollupError>;

/// Error chain helper for adding context
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| RollupError::Configuration(format!("{}: {}", msg.into(), e)))
    }
}
