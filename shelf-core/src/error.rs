//! Error types for Shelf Core

use thiserror::Error;

/// Result type alias using ShelfError
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Top-level error type for all Shelf operations
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while persisting local state
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

impl StorageError {
    /// Whether the error only means the key has never been written
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Errors raised by catalog, directory and library operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Book not found: {0}")]
    BookNotFound(u64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Administrator access required")]
    NotAdmin,
}

/// A single image load failed.
///
/// These never escape the image pipeline; they are absorbed into the next
/// tier and only surface through logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Decode failure: {0}")]
    Decode(String),
}
