//! Error types for the taxi-trips pipeline
//!
//! Every fallible operation in the crate returns `Result<T, Error>`.
//! Failures are scoped to the smallest unit that produced them (a page,
//! a batch, a partition); the caller decides whether to continue.

use std::path::Path;
use thiserror::Error;

/// The main error type for the pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded for page {page}")]
    MaxRetriesExceeded { page: u64, max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to read batch '{path}': {message}")]
    BatchRead { path: String, message: String },

    #[error("Schema error on column '{field}': {message}")]
    Schema { field: String, message: String },

    #[error("Partition '{path}' is unreadable: {message}")]
    PartitionCorrupt { path: String, message: String },

    #[error("Unparseable timestamp '{value}': {message}")]
    TimestampParse { value: String, message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a batch read error for the given file
    pub fn batch_read(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::BatchRead {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Create a schema error for a column
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt partition error
    pub fn partition_corrupt(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::PartitionCorrupt {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Create a timestamp parse error
    pub fn timestamp_parse(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TimestampParse {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Check if this error is a transient network or server failure.
    ///
    /// The fetcher retries every failed attempt regardless; this only
    /// decides how the attempt is reported.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout { .. } | Error::Decode { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the pipeline
pub type Result<T> = std::result::Result<T, Error>;
