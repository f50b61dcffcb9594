//! Error types for the document model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while parsing or validating the document.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The wire payload is not a JSON object.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A timestamp string could not be parsed as RFC 3339.
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp {
        /// The offending value.
        value: String,
    },

    /// A calendar date string could not be parsed.
    #[error("invalid date: {value}")]
    InvalidDate {
        /// The offending value.
        value: String,
    },

    /// A UTC offset string could not be parsed (expected e.g. "+05:30").
    #[error("invalid utc offset: {value}")]
    InvalidUtcOffset {
        /// The offending value.
        value: String,
    },

    /// An entity is missing its identity key.
    #[error("missing identity in collection {collection}: {detail}")]
    MissingIdentity {
        /// Collection name.
        collection: &'static str,
        /// What was missing.
        detail: String,
    },

    /// An unknown resource-request status value.
    #[error("unknown request status: {value}")]
    UnknownStatus {
        /// The offending value.
        value: String,
    },

    /// JSON decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
