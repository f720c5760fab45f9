//! Collection persistence policy.

/// Default key holding the persisted collection.
pub const DEFAULT_STORAGE_KEY: &str = "snapstix_v1_collection";
/// Default number of stickers mirrored to storage.
pub const DEFAULT_MAX_PERSISTED: usize = 10;

/// Policy for mirroring the collection to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPolicy {
    /// Key under which the collection is stored.
    pub storage_key: String,
    /// Maximum number of most-recent stickers persisted.
    pub max_persisted: usize,
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_persisted: DEFAULT_MAX_PERSISTED,
        }
    }
}
