//! Error types for the key-value storage boundary.

/// Errors returned by key-value stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Writing would exceed the store's capacity.
    #[error("quota exceeded: {requested} bytes requested, limit {limit}")]
    QuotaExceeded { requested: u64, limit: u64 },
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store cannot be used right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// True for the capacity condition that triggers pruning.
    pub fn is_quota(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}
