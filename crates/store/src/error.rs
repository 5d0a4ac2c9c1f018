//! Error types for document stores

use warden_document::{JsonError, ValueError};

/// A record could not be converted to or from a document.
///
/// During `reload` this drops the offending document. During `save` and
/// `update` it aborts the write before anything reaches the collection.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// A required key was absent or null
    #[error("Missing required field `{0}`")]
    MissingField(String),

    /// A key held a value of the wrong kind
    #[error("Invalid field `{field}`: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: ValueError,
    },

    /// A key held the right kind but an unusable value
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    /// serde could not map the record
    #[error("Serde conversion failed: {0}")]
    Serde(#[from] serde_json::Error),

    /// Extended JSON could not be mapped to a document
    #[error("JSON conversion failed: {0}")]
    Json(#[from] JsonError),
}

/// The backing collection could not complete a request
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// Failed to read or write the underlying files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode a document for storage
    #[error("Failed to encode document: {0}")]
    Encode(#[from] JsonError),

    /// The `_id` field held something other than an object id
    #[error("Invalid document id: {0}")]
    InvalidId(#[from] ValueError),

    /// The collection refused the connection
    #[error("Collection unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to store callers
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record could not be serialized; nothing was written
    #[error("Serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    /// The backing collection could not be reached
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] CollectionError),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
