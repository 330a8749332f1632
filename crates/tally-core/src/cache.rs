//! Offline cache: last successful read per cache key.
//!
//! Entries live in memory and are mirrored into a single durable key holding
//! a `cache key -> CacheEntry` map. The mirror is advisory: a failed durable
//! write is logged and the in-memory update still counts. When the mirror
//! cannot be read it is rebuilt from memory on the next write. Entries never
//! expire.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::CacheEntry;
use crate::ports::{Clock, DurableStore};

type DurableMap = HashMap<String, CacheEntry>;

pub struct OfflineCache {
    memory: Mutex<HashMap<String, CacheEntry>>,
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    durable_key: String,
}

impl OfflineCache {
    pub fn new(
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
        durable_key: impl Into<String>,
    ) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            store,
            clock,
            durable_key: durable_key.into(),
        }
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a result confirmed fresh from the network.
    pub fn store(&self, key: &str, data: serde_json::Value) {
        self.put(key, data, true);
    }

    /// Store locally produced data that the server has not confirmed.
    pub fn store_local(&self, key: &str, data: serde_json::Value) {
        self.put(key, data, false);
    }

    fn put(&self, key: &str, data: serde_json::Value, synced: bool) {
        let entry = CacheEntry {
            key: key.to_string(),
            data,
            timestamp: self.clock.now(),
            synced,
        };
        self.memory().insert(key.to_string(), entry.clone());

        let mut durable = self.durable_or_memory();
        durable.insert(key.to_string(), entry);
        self.save_durable(&durable);
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entry(key).map(|entry| entry.data)
    }

    /// Memory first, then the durable mirror (hydrating memory on a hit).
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        if let Some(entry) = self.memory().get(key) {
            return Some(entry.clone());
        }

        let entry = self.load_durable()?.remove(key)?;
        tracing::debug!(cache_key = key, "cache hit from durable mirror");
        self.memory().insert(key.to_string(), entry.clone());
        Some(entry)
    }

    pub fn clear(&self, key: &str) {
        self.memory().remove(key);

        let mut durable = self.durable_or_memory();
        durable.remove(key);
        self.save_durable(&durable);
    }

    /// Number of distinct keys across memory and the durable mirror.
    pub fn len(&self) -> usize {
        let mut keys: HashSet<String> = self.memory().keys().cloned().collect();
        if let Some(durable) = self.load_durable() {
            keys.extend(durable.into_keys());
        }
        keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` when the mirror is absent or unreadable.
    fn load_durable(&self) -> Option<DurableMap> {
        let raw = match self.store.get(&self.durable_key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read offline cache");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt offline cache");
                None
            }
        }
    }

    /// The mirror, or the in-memory entries when it is absent or unreadable.
    fn durable_or_memory(&self) -> DurableMap {
        match self.load_durable() {
            Some(map) => map,
            None => self.memory().clone(),
        }
    }

    fn save_durable(&self, map: &DurableMap) {
        let result = if map.is_empty() {
            self.store.remove(&self.durable_key)
        } else {
            match serde_json::to_string(map) {
                Ok(json) => self.store.set(&self.durable_key, &json),
                Err(e) => Err(e.into()),
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist offline cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StorageError;
    use crate::impls::MemoryStore;
    use crate::ports::SystemClock;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    const KEY: &str = "tally-offline-data";

    fn cache_over(store: MemoryStore) -> OfflineCache {
        OfflineCache::new(Arc::new(store), Arc::new(SystemClock), KEY)
    }

    #[test]
    fn store_then_get() {
        let cache = cache_over(MemoryStore::new());
        cache.store("k", json!({"a": 1}));

        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
        assert!(cache.entry("k").unwrap().synced);
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn last_write_wins() {
        let cache = cache_over(MemoryStore::new());
        cache.store("k", json!(1));
        cache.store_local("k", json!(2));

        let entry = cache.entry("k").unwrap();
        assert_eq!(entry.data, json!(2));
        assert!(!entry.synced);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn falls_back_to_durable_mirror_after_reset() {
        let store = MemoryStore::new();
        cache_over(store.clone()).store("k", json!({"a": 1}));

        let fresh = cache_over(store);
        assert_eq!(fresh.get("k"), Some(json!({"a": 1})));
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn clear_removes_both_copies() {
        let store = MemoryStore::new();
        let cache = cache_over(store.clone());
        cache.store("k", json!(1));
        cache.store("j", json!(2));

        cache.clear("k");
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache_over(store.clone()).get("k"), None);
        assert_eq!(cache_over(store.clone()).get("j"), Some(json!(2)));

        cache.clear("j");
        assert!(!store.contains_key(KEY));
        assert!(cache.is_empty());
    }

    struct BrokenStore;

    impl DurableStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk gone".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk gone".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk gone".into()))
        }
    }

    #[test]
    fn storage_failures_do_not_block_the_memory_path() {
        let cache = OfflineCache::new(Arc::new(BrokenStore), Arc::new(SystemClock), KEY);
        cache.store("k", json!("still here"));
        assert_eq!(cache.get("k"), Some(json!("still here")));

        cache.clear("k");
        assert_eq!(cache.get("k"), None);
    }

    /// Fails the next `get` once, then behaves like the wrapped store.
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: AtomicBool,
    }

    impl DurableStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_next_get.swap(false, Ordering::SeqCst) {
                return Err(StorageError::Unavailable("read timed out".into()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn flaky_cache() -> (OfflineCache, Arc<FlakyStore>, MemoryStore) {
        let inner = MemoryStore::new();
        let flaky = Arc::new(FlakyStore {
            inner: inner.clone(),
            fail_next_get: AtomicBool::new(false),
        });
        let cache = OfflineCache::new(flaky.clone(), Arc::new(SystemClock), KEY);
        (cache, flaky, inner)
    }

    #[test]
    fn failed_mirror_read_keeps_other_entries_on_store() {
        let (cache, flaky, inner) = flaky_cache();
        cache.store("a", json!(1));
        cache.store("b", json!(2));

        flaky.fail_next_get.store(true, Ordering::SeqCst);
        cache.store("c", json!(3));

        let fresh = cache_over(inner);
        assert_eq!(fresh.get("a"), Some(json!(1)));
        assert_eq!(fresh.get("b"), Some(json!(2)));
        assert_eq!(fresh.get("c"), Some(json!(3)));
        assert_eq!(fresh.len(), 3);
    }

    #[test]
    fn failed_mirror_read_still_clears_the_key() {
        let (cache, flaky, inner) = flaky_cache();
        cache.store("a", json!(1));
        cache.store("b", json!(2));

        flaky.fail_next_get.store(true, Ordering::SeqCst);
        cache.clear("a");

        let fresh = cache_over(inner);
        assert_eq!(fresh.get("a"), None);
        assert_eq!(fresh.get("b"), Some(json!(2)));
    }

    #[test]
    fn corrupt_mirror_is_ignored() {
        let store = MemoryStore::new();
        store.set(KEY, "{not json").unwrap();

        let cache = cache_over(store.clone());
        assert_eq!(cache.get("k"), None);
        cache.store("k", json!(1));
        assert_eq!(cache_over(store).get("k"), Some(json!(1)));
    }
}
