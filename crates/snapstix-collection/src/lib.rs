//! Sticker collection with a capacity-bounded local mirror.

pub mod error;
pub mod kv;
pub mod policy;
pub mod store;

/// Storage error type.
pub use error::StorageError;
/// Key-value storage boundary and default backends.
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
/// Persistence policy.
pub use policy::CollectionPolicy;
/// Collection store and persistence outcomes.
pub use store::{CollectionStore, PersistOutcome};
