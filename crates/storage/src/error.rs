use thiserror::Error;

/// Errors that can occur during document storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(String),

    /// A candidate key does not look like a storage key.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// An inline payload failed to decode.
    #[error("invalid inline payload: {0}")]
    InvalidPayload(String),

    /// A storage backend error occurred.
    #[error("storage backend error: {0}")]
    Backend(String),
}
