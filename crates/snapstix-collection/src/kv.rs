//! Size-limited key-value storage backends.

use crate::error::StorageError;
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// String key-value store with whole-value writes.
///
/// A `set` replaces the stored value as one unit: readers see either the
/// previous value or the new one, never a partial write.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Extension used for stored values.
const VALUE_EXTENSION: &str = "json";

/// File-backed store keeping one file per key under a root directory.
pub struct FileKeyValueStore {
    /// Root directory for stored values.
    root: PathBuf,
    /// Byte quota across all stored values.
    quota_bytes: Option<u64>,
    /// Serialize writers so quota accounting stays consistent.
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Create a store under `root` with an optional byte quota.
    pub fn new(root: impl AsRef<Path>, quota_bytes: Option<u64>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!(
            "initialized file key-value store (root={}, quota_bytes={:?})",
            root.display(),
            quota_bytes
        );
        Ok(Self {
            root,
            quota_bytes,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the file backing `key`.
    fn value_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    /// Bytes used by all values except `key`.
    fn used_bytes_excluding(&self, key_path: &Path) -> Result<u64, StorageError> {
        let mut used = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path == key_path
                || path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION)
            {
                continue;
            }
            used += fs::metadata(&path)?.len();
        }
        Ok(used)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.value_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Write through a temp file and rename over the previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let path = self.value_path(key)?;
        if let Some(limit) = self.quota_bytes {
            let requested = self.used_bytes_excluding(&path)? + value.len() as u64;
            if requested > limit {
                return Err(StorageError::QuotaExceeded { requested, limit });
            }
        }
        let temp_path = self.root.join(format!("{key}.{VALUE_EXTENSION}.tmp"));
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;
        debug!("stored value (key={}, bytes={})", key, value.len());
        Ok(())
    }
}

/// In-memory store with an optional byte quota over keys and values.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.write();
        if let Some(limit) = self.quota_bytes {
            let used: u64 = values
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| (existing.len() + stored.len()) as u64)
                .sum();
            let requested = used + (key.len() + value.len()) as u64;
            if requested > limit {
                return Err(StorageError::QuotaExceeded { requested, limit });
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Keys map to file names, so only a conservative charset is accepted.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::Unavailable(format!("invalid storage key: {key}")))
    }
}
