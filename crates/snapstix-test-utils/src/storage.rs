use parking_lot::Mutex;
use snapstix_collection::{KeyValueStore, MemoryKeyValueStore, StorageError};

/// Store that only fits JSON arrays up to a fixed length.
///
/// `full()` rejects every write, even an empty array.
pub struct CountLimitedStore {
    inner: MemoryKeyValueStore,
    max_items: Option<usize>,
    attempts: Mutex<Vec<usize>>,
}

impl CountLimitedStore {
    pub fn new(max_items: usize) -> Self {
        Self {
            inner: MemoryKeyValueStore::new(),
            max_items: Some(max_items),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn full() -> Self {
        Self {
            inner: MemoryKeyValueStore::new(),
            max_items: None,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Array lengths of every attempted write, in order.
    pub fn attempts(&self) -> Vec<usize> {
        self.attempts.lock().clone()
    }
}

impl KeyValueStore for CountLimitedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let items = serde_json::from_str::<Vec<serde_json::Value>>(value)?.len();
        self.attempts.lock().push(items);
        match self.max_items {
            Some(limit) if items <= limit => self.inner.set(key, value),
            limit => Err(StorageError::QuotaExceeded {
                requested: items as u64,
                limit: limit.unwrap_or_default() as u64,
            }),
        }
    }
}

/// Store whose writes fail with an IO error.
pub struct BrokenStore {
    stored: Option<String>,
    attempts: Mutex<usize>,
}

impl BrokenStore {
    pub fn new() -> Self {
        Self {
            stored: None,
            attempts: Mutex::new(0),
        }
    }

    /// Serve `raw` from reads while writes keep failing.
    pub fn with_stored(raw: impl Into<String>) -> Self {
        Self {
            stored: Some(raw.into()),
            attempts: Mutex::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

impl Default for BrokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.stored.clone())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        *self.attempts.lock() += 1;
        Err(StorageError::Io(std::io::Error::other("disk unavailable")))
    }
}
