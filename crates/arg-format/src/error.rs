//! Error types for ARG reading and writing.

use thiserror::Error;

/// Errors that can occur while handling ARG metadata, payloads or datasets.
#[derive(Error, Debug)]
pub enum ArgError {
    /// The JSON sidecar is missing a required key or has one of the wrong kind.
    #[error("malformed ARG metadata: {0}")]
    MalformedMetadata(String),

    /// The `datatype` tag is not one of the ten recognized tags.
    #[error("unsupported ARG data type: {0}")]
    UnsupportedType(String),

    /// The payload length does not match `cell_count * width`.
    #[error("truncated ARG payload: expected {expected} bytes, got {actual}")]
    TruncatedData { expected: usize, actual: usize },

    /// A present cell does not fit the declared data type.
    #[error("value at cell {index} ({value}) is out of range for {data_type}")]
    ValueRange {
        index: usize,
        value: String,
        data_type: String,
    },

    /// A cell buffer does not hold `cols * rows` cells.
    #[error("shape mismatch: expected {expected} cells, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The path does not name an ARG dataset.
    #[error("not an ARG dataset: {0}")]
    NotArg(String),

    /// The source geometry cannot be expressed as ARG.
    #[error("unsupported source: {0}")]
    Unsupported(String),

    /// Target dataset exists and overwriting is disabled.
    #[error("dataset already exists: {0}")]
    AlreadyExists(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArgError {
    /// Create a MalformedMetadata error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMetadata(msg.into())
    }

    /// Create a ValueRange error.
    pub fn value_range(index: usize, value: impl ToString, data_type: impl ToString) -> Self {
        Self::ValueRange {
            index,
            value: value.to_string(),
            data_type: data_type.to_string(),
        }
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

impl From<serde_json::Error> for ArgError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedMetadata(err.to_string())
    }
}

/// Result type for ARG operations.
pub type Result<T> = std::result::Result<T, ArgError>;
