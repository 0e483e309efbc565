//! Storage error types

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`crate::KeyValueStore`] backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another holder of the store lock panicked
    #[error("Store lock poisoned")]
    Poisoned,

    /// The store file is not a JSON object of strings
    #[error("Corrupt store file: {0}")]
    Corrupt(String),
}
