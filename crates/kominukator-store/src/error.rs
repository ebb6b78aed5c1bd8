use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (e.g. writing a slot file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document or session could not be serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Slot keys must be plain names (no separators or traversal).
    #[error("Invalid slot key: {0}")]
    InvalidKey(String),

    /// The backend is unusable (e.g. a poisoned lock).
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
