//! Typed errors for the tracker library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to keep the
//! failure taxonomy explicit: per-URL fetch and extraction errors are
//! recoverable and contained by the pipeline, while state persistence
//! errors are fatal to the run.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Network/site failure for a single URL
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The semantic extractor failed or returned unusable output
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Persisted state unreadable or unwritable (fatal)
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// Transient, per-URL fetch failures.
///
/// These never abort a run: the pipeline logs them, leaves the URL's
/// fingerprint untouched, and moves on to the next page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connect, TLS, timeout, body read)
    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Non-success status code
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Failures from the external semantic-extraction service.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The extraction API call itself failed
    #[error("extraction service error: {0}")]
    Api(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service responded but the payload was not usable
    #[error("unparseable extractor response: {reason}")]
    UnparseableResponse { reason: String },

    /// Missing credentials or endpoint configuration
    #[error("extractor config error: {0}")]
    Config(String),
}

/// Fatal persistence problems.
///
/// A run terminates with a non-zero exit on these, leaving any
/// on-disk state untouched.
#[derive(Debug, Error)]
pub enum StateError {
    /// File could not be read or written
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but does not deserialize
    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization failed on save
    #[error("failed to serialize state for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// A single malformed event record within an otherwise valid batch.
///
/// Recovered locally: the record is dropped with a warning and the
/// rest of the batch proceeds.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Record has no usable title
    #[error("event record has no title")]
    MissingTitle,

    /// Record has no parseable date
    #[error("event record {title:?} has no parseable date")]
    MissingDate { title: String },
}
