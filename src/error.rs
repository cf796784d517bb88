//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`PipelineError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// Nothing in this crate retries or recovers; every variant is meant to reach the caller.
///
/// # Example
///
/// ```rust,no_run
/// use sentiment_pipelines::error::PipelineError;
///
/// fn describe(e: &PipelineError) -> &'static str {
///     match e {
///         PipelineError::ResourceUnavailable(_) => "dataset or model could not be fetched",
///         PipelineError::SchemaMismatch(_) => "splits do not share a schema",
///         PipelineError::Io(_) => "local file could not be written",
///         _ => "other failure",
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Dataset, split, model or file could not be resolved or downloaded.
    #[error("{0}")]
    ResourceUnavailable(String),

    /// Tables that were meant to be stacked have different columns.
    #[error("{0}")]
    SchemaMismatch(String),

    /// Local filesystem failure (permissions, disk full, missing directory).
    #[error("{0}")]
    Io(String),

    /// Tokenizer construction or encoding failure. Check input text.
    #[error("{0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<hf_hub::api::sync::ApiError> for PipelineError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        PipelineError::ResourceUnavailable(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Io(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<arrow::error::ArrowError> for PipelineError {
    fn from(value: arrow::error::ArrowError) -> Self {
        match value {
            arrow::error::ArrowError::IoError(msg, _) => PipelineError::Io(msg),
            other => PipelineError::Unexpected(other.to_string()),
        }
    }
}

impl From<parquet::errors::ParquetError> for PipelineError {
    fn from(value: parquet::errors::ParquetError) -> Self {
        PipelineError::Io(format!("Parquet error: {}", value))
    }
}
