//! # Tessera Cache
//!
//! Cache-provider capability for the Tessera SDK.
//!
//! The core only requires keyed get/put/remove with configurable
//! time-to-live and time-to-idle semantics. Two reference variants are
//! provided: [`InMemoryCache`] and the disabled [`NullCache`]. Custom
//! backends implement [`CacheProvider`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::trace;

/// Expiration settings for a cache region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum lifetime of an entry from creation, in seconds (default: 3600).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum idle time of an entry since last access, in seconds
    /// (default: 3600).
    #[serde(default = "default_tti_secs")]
    pub tti_secs: u64,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_tti_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            tti_secs: default_tti_secs(),
        }
    }
}

impl CacheConfig {
    /// Set the time-to-live.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// Set the time-to-idle.
    #[must_use]
    pub fn with_tti(mut self, tti: Duration) -> Self {
        self.tti_secs = tti.as_secs();
        self
    }
}

/// Keyed cache with expiration.
///
/// `get` refreshes the idle clock of a live entry. Expired entries behave
/// as absent.
pub trait CacheProvider<V: Clone + Send + Sync>: Send + Sync {
    /// Look up a live entry.
    fn get(&self, key: &str) -> Option<V>;

    /// Store an entry, replacing any existing one.
    fn put(&self, key: &str, value: V);

    /// Drop an entry, returning it if it was present and live.
    fn remove(&self, key: &str) -> Option<V>;
}

struct Entry<V> {
    value: V,
    created: Instant,
    last_access: Instant,
}

/// In-memory cache with time-to-live and time-to-idle expiry.
pub struct InMemoryCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
    tti: Duration,
}

impl<V> InMemoryCache<V> {
    /// Create a cache with the given expiration settings.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::from_secs(config.ttl_secs),
            tti: Duration::from_secs(config.tti_secs),
        }
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.duration_since(entry.created) >= self.ttl
            || now.duration_since(entry.last_access) >= self.tti
    }
}

impl<V> Default for InMemoryCache<V> {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl<V: Clone + Send + Sync> CacheProvider<V> for InMemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let now = Instant::now();
        match entries.get_mut(key) {
            Some(entry) if !self.is_expired(entry, now) => {
                entry.last_access = now;
                Some(entry.value.clone())
            }
            Some(_) => {
                trace!(key, "dropping expired cache entry");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: V) {
        let now = Instant::now();
        self.entries.lock().expect("cache lock poisoned").insert(
            key.to_string(),
            Entry {
                value,
                created: now,
                last_access: now,
            },
        );
    }

    fn remove(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.remove(key)?;
        if self.is_expired(&entry, Instant::now()) {
            None
        } else {
            Some(entry.value)
        }
    }
}

/// Disabled cache: never stores, every lookup misses.
pub struct NullCache<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> NullCache<V> {
    /// Create a disabled cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for NullCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> CacheProvider<V> for NullCache<V> {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn put(&self, _key: &str, _value: V) {}

    fn remove(&self, _key: &str) -> Option<V> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_round_trip() {
        let cache = InMemoryCache::new(&CacheConfig::default());
        cache.put("k", 42u64);
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn test_miss_on_absent_key() {
        let cache: InMemoryCache<u64> = InMemoryCache::default();
        assert_eq!(cache.get("absent"), None);
    }

    #[test]
    fn test_ttl_expiry() {
        let config = CacheConfig {
            ttl_secs: 0,
            tti_secs: 3600,
        };
        let cache = InMemoryCache::new(&config);
        cache.put("k", 1u64);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_tti_expiry() {
        let config = CacheConfig {
            ttl_secs: 3600,
            tti_secs: 0,
        };
        let cache = InMemoryCache::new(&config);
        cache.put("k", 1u64);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_remove_returns_live_entry() {
        let cache = InMemoryCache::default();
        cache.put("k", "v".to_string());
        assert_eq!(cache.remove("k"), Some("v".to_string()));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_null_cache_never_stores() {
        let cache = NullCache::new();
        cache.put("k", 1u64);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.remove("k"), None);
    }

    #[test]
    fn test_replacing_put_resets_clock() {
        let cache = InMemoryCache::new(&CacheConfig::default());
        cache.put("k", 1u64);
        cache.put("k", 2u64);
        assert_eq!(cache.get("k"), Some(2));
    }
}
