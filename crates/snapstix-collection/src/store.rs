//! In-memory sticker collection mirrored to a key-value store.

use crate::error::StorageError;
use crate::kv::KeyValueStore;
use crate::policy::CollectionPolicy;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use snapstix_protocol::Sticker;
use std::sync::Arc;

/// Result of mirroring the collection to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The newest `count` stickers were written.
    Saved { count: usize },
    /// Nothing was written this round.
    Abandoned { attempts: usize, reason: String },
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistOutcome::Saved { .. })
    }
}

/// Newest-first sticker collection.
///
/// The in-memory list is authoritative. Storage holds at most
/// `max_persisted` of the newest stickers, without their source photos.
pub struct CollectionStore {
    stickers: RwLock<Vec<Sticker>>,
    backend: Arc<dyn KeyValueStore>,
    policy: CollectionPolicy,
    /// Serialize persists so the last write reflects the latest list.
    persist_lock: Mutex<()>,
}

impl CollectionStore {
    /// Load the persisted collection; unusable data yields an empty list.
    pub fn load(backend: Arc<dyn KeyValueStore>, policy: CollectionPolicy) -> Self {
        let stickers = read_persisted(backend.as_ref(), &policy.storage_key);
        info!(
            "loaded sticker collection (key={}, count={})",
            policy.storage_key,
            stickers.len()
        );
        Self {
            stickers: RwLock::new(stickers),
            backend,
            policy,
            persist_lock: Mutex::new(()),
        }
    }

    /// Add a sticker at the front and mirror the collection.
    ///
    /// Storage failures are logged; the sticker stays in memory either way.
    pub fn append(&self, sticker: Sticker) -> PersistOutcome {
        debug!("appending sticker (id={})", sticker.id);
        self.stickers.write().insert(0, sticker);
        self.persist()
    }

    /// Write the newest stickers, dropping the oldest while over quota.
    pub fn persist(&self) -> PersistOutcome {
        let _guard = self.persist_lock.lock();
        let mut candidates: Vec<Sticker> = self
            .stickers
            .read()
            .iter()
            .take(self.policy.max_persisted)
            .map(Sticker::without_source)
            .collect();

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.write(&candidates) {
                Ok(()) => {
                    debug!(
                        "persisted collection (count={}, attempts={})",
                        candidates.len(),
                        attempts
                    );
                    return PersistOutcome::Saved {
                        count: candidates.len(),
                    };
                }
                Err(err) if err.is_quota() && !candidates.is_empty() => {
                    candidates.pop();
                    warn!(
                        "storage quota exceeded, pruning oldest (remaining={}, error={})",
                        candidates.len(),
                        err
                    );
                }
                Err(err) => {
                    warn!(
                        "abandoned collection persist (attempts={}, error={})",
                        attempts, err
                    );
                    return PersistOutcome::Abandoned {
                        attempts,
                        reason: err.to_string(),
                    };
                }
            }
        }
    }

    fn write(&self, candidates: &[Sticker]) -> Result<(), StorageError> {
        let payload = serde_json::to_string(candidates)?;
        self.backend.set(&self.policy.storage_key, &payload)
    }

    /// Copy of the full collection, newest first.
    pub fn snapshot(&self) -> Vec<Sticker> {
        self.stickers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.stickers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stickers.read().is_empty()
    }

    /// Look up a sticker by id.
    pub fn get(&self, id: &str) -> Option<Sticker> {
        self.stickers
            .read()
            .iter()
            .find(|sticker| sticker.id == id)
            .cloned()
    }

    pub fn policy(&self) -> &CollectionPolicy {
        &self.policy
    }
}

fn read_persisted(backend: &dyn KeyValueStore, key: &str) -> Vec<Sticker> {
    let raw = match backend.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!("failed to read collection (key={key}, error={err})");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(stickers) => stickers,
        Err(err) => {
            warn!("ignoring corrupt collection (key={key}, error={err})");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;

    fn sticker(slot: usize) -> Sticker {
        Sticker::new(
            slot,
            Some("data:image/jpeg;base64,c291cmNl".to_string()),
            "data:image/png;base64,cmVzdWx0".to_string(),
            format!("Ninja ({slot})"),
        )
    }

    fn persisted(backend: &MemoryKeyValueStore) -> Vec<Sticker> {
        let raw = backend
            .get(crate::policy::DEFAULT_STORAGE_KEY)
            .expect("get")
            .expect("stored");
        serde_json::from_str(&raw).expect("decode")
    }

    #[test]
    fn load_without_data_is_empty() {
        let store = CollectionStore::load(
            Arc::new(MemoryKeyValueStore::new()),
            CollectionPolicy::default(),
        );
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_payload_loads_as_empty() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set(crate::policy::DEFAULT_STORAGE_KEY, "{not json")
            .expect("set");
        let store = CollectionStore::load(backend, CollectionPolicy::default());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn append_keeps_newest_first_and_strips_sources() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let store = CollectionStore::load(backend.clone(), CollectionPolicy::default());
        let first = sticker(0);
        let second = sticker(1);

        assert!(store.append(first.clone()).is_saved());
        assert_eq!(
            store.append(second.clone()),
            PersistOutcome::Saved { count: 2 }
        );

        let in_memory = store.snapshot();
        assert_eq!(in_memory[0].id, second.id);
        assert!(in_memory[0].source_image.is_some());

        let stored = persisted(&backend);
        assert_eq!(stored, vec![second.without_source(), first.without_source()]);
        let raw = backend
            .get(crate::policy::DEFAULT_STORAGE_KEY)
            .expect("get")
            .expect("stored");
        assert!(!raw.contains("sourceImage"));
    }

    #[test]
    fn persist_caps_at_max_but_memory_keeps_everything() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let store = CollectionStore::load(backend.clone(), CollectionPolicy::default());
        for slot in 0..12 {
            store.append(sticker(slot));
        }
        assert_eq!(store.len(), 12);
        let stored = persisted(&backend);
        assert_eq!(stored.len(), 10);
        assert_eq!(stored[0].id, store.snapshot()[0].id);
    }

    #[test]
    fn persist_is_idempotent() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let store = CollectionStore::load(backend.clone(), CollectionPolicy::default());
        store.append(sticker(0));
        let before = backend.get(crate::policy::DEFAULT_STORAGE_KEY).expect("get");
        assert!(store.persist().is_saved());
        let after = backend.get(crate::policy::DEFAULT_STORAGE_KEY).expect("get");
        assert_eq!(before, after);
    }

    #[test]
    fn byte_quota_prunes_oldest() {
        let one = serde_json::to_string(&[sticker(0).without_source()])
            .expect("encode")
            .len();
        let key_len = crate::policy::DEFAULT_STORAGE_KEY.len();
        // Room for two stickers but never three.
        let backend = Arc::new(MemoryKeyValueStore::with_quota(
            (key_len + one * 2 + 8) as u64,
        ));
        let store = CollectionStore::load(backend.clone(), CollectionPolicy::default());
        store.append(sticker(0));
        store.append(sticker(1));
        let outcome = store.append(sticker(2));

        assert_eq!(outcome, PersistOutcome::Saved { count: 2 });
        let stored = persisted(&backend);
        let newest: Vec<String> = store.snapshot()[..2].iter().map(|s| s.id.clone()).collect();
        assert_eq!(stored.iter().map(|s| s.id.clone()).collect::<Vec<_>>(), newest);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn get_finds_by_id() {
        let store = CollectionStore::load(
            Arc::new(MemoryKeyValueStore::new()),
            CollectionPolicy::default(),
        );
        let item = sticker(3);
        store.append(item.clone());
        assert_eq!(store.get(&item.id), Some(item));
        assert_eq!(store.get("missing"), None);
    }
}
