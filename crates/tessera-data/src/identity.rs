//! Identity map
//!
//! Guarantees at most one live [`ResourceData`] record per canonical href
//! within the expiration window. Concurrent materializations of the same
//! resource converge on a single shared record, so facades produced at
//! different times alias the same mutable state.

use std::sync::Mutex;
use tracing::trace;

use tessera_cache::CacheProvider;

use crate::data::{shared, ResourceData, SharedResourceData};

/// Time-expiring arena of shared resource-data records keyed by
/// canonical href (case-insensitive).
pub struct IdentityMap {
    entries: Box<dyn CacheProvider<SharedResourceData>>,
    // Serializes lookup+insert so concurrent get_or_add calls for one key
    // converge on a single record.
    guard: Mutex<()>,
}

impl IdentityMap {
    /// Create an identity map over the given cache provider.
    #[must_use]
    pub fn new(entries: Box<dyn CacheProvider<SharedResourceData>>) -> Self {
        Self {
            entries,
            guard: Mutex::new(()),
        }
    }

    fn normalize(key: &str) -> String {
        key.trim_end_matches('/').to_lowercase()
    }

    /// Return the live record for `key`, or build one with `factory` and
    /// store it.
    pub fn get_or_add<F>(&self, key: &str, factory: F) -> SharedResourceData
    where
        F: FnOnce() -> ResourceData,
    {
        let key = Self::normalize(key);
        let _guard = self.guard.lock().expect("identity map lock poisoned");
        if let Some(existing) = self.entries.get(&key) {
            trace!(key, "identity map hit");
            return existing;
        }
        trace!(key, "identity map miss");
        let record = shared(factory());
        self.entries.put(&key, record.clone());
        record
    }

    /// Store `record` under `key` unless a live entry already exists, in
    /// which case the existing record is returned and `record` is not
    /// stored. Used to register freshly created resources.
    pub fn link(&self, key: &str, record: SharedResourceData) -> SharedResourceData {
        let key = Self::normalize(key);
        let _guard = self.guard.lock().expect("identity map lock poisoned");
        if let Some(existing) = self.entries.get(&key) {
            return existing;
        }
        self.entries.put(&key, record.clone());
        record
    }

    /// Look up a live record without creating one.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<SharedResourceData> {
        self.entries.get(&Self::normalize(key))
    }

    /// Drop the record for `key` (resource deleted remotely).
    pub fn evict(&self, key: &str) {
        self.entries.remove(&Self::normalize(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_cache::{CacheConfig, InMemoryCache, NullCache};
    use tessera_core::PropertyValue;

    fn map() -> IdentityMap {
        IdentityMap::new(Box::new(InMemoryCache::new(&CacheConfig::default())))
    }

    #[test]
    fn test_same_key_returns_same_record() {
        let map = map();
        let a = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        let b = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let map = map();
        let a = map.get_or_add("https://api.example.com/Accounts/A1", ResourceData::new);
        let b = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_mutation_visible_through_alias() {
        let map = map();
        let a = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        let b = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        a.write()
            .unwrap()
            .set("email", PropertyValue::from("vader@empire.gov"));
        assert_eq!(
            b.read().unwrap().get("email").unwrap().as_str(),
            Some("vader@empire.gov")
        );
    }

    #[test]
    fn test_evict_forces_fresh_record() {
        let map = map();
        let a = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        map.evict("https://api.example.com/accounts/a1");
        let b = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_null_cache_disables_linking() {
        let map = IdentityMap::new(Box::new(NullCache::new()));
        let a = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        let b = map.get_or_add("https://api.example.com/accounts/a1", ResourceData::new);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_get_or_add_converges() {
        let map = Arc::new(map());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let map = Arc::clone(&map);
                std::thread::spawn(move || {
                    map.get_or_add("https://api.example.com/groups/g1", ResourceData::new)
                })
            })
            .collect();
        let records: Vec<SharedResourceData> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for record in &records[1..] {
            assert!(Arc::ptr_eq(&records[0], record));
        }
    }
}
