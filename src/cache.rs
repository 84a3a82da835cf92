//! In-memory, process-lifetime TTL cache (component F).
//!
//! Used for provider bootstrap tokens (KG `dfid`, NE anonymous session) and
//! translation memoization. Entries with `expire_at = None` never expire.
//! Expiry is lazy: a `get` past its expiry deletes the entry and reports a
//! miss rather than running a background sweep.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expire_at: Option<Instant>,
}

/// A thread-safe key -> value map with per-entry expiry.
pub struct TtlCache<K, V> {
    inner: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a live value, deleting it first if its expiry has passed.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock().expect("ttl cache poisoned");
        let expired = match guard.get(key) {
            Some(entry) => matches!(entry.expire_at, Some(at) if Instant::now() >= at),
            None => {
                tracing::debug!("ttl cache: miss");
                return None;
            }
        };
        if expired {
            guard.remove(key);
            tracing::debug!("ttl cache: expired entry evicted");
            return None;
        }
        let hit = guard.get(key).map(|e| e.value.clone());
        tracing::debug!("ttl cache: hit");
        hit
    }

    /// Insert a value that never expires.
    pub fn set_forever(&self, key: K, value: V) {
        let mut guard = self.inner.lock().expect("ttl cache poisoned");
        guard.insert(key, Entry { value, expire_at: None });
        tracing::debug!("ttl cache: insert (no expiry)");
    }

    /// Insert a value that expires after `ttl`.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let mut guard = self.inner.lock().expect("ttl cache poisoned");
        guard.insert(
            key,
            Entry {
                value,
                expire_at: Some(Instant::now() + ttl),
            },
        );
        tracing::debug!(ttl_secs = ttl.as_secs(), "ttl cache: insert");
    }

    pub fn remove(&self, key: &K) {
        let mut guard = self.inner.lock().expect("ttl cache poisoned");
        if guard.remove(key).is_some() {
            tracing::debug!("ttl cache: removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn never_expires_without_ttl() {
        let cache: TtlCache<String, i32> = TtlCache::new();
        cache.set_forever("k".to_string(), 1);
        assert_eq!(cache.get(&"k".to_string()), Some(1));
    }

    #[test]
    fn expires_after_ttl() {
        let cache: TtlCache<String, i32> = TtlCache::new();
        cache.set("k".to_string(), 1, Duration::from_millis(5));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"k".to_string()), None);
    }

    #[test]
    fn missing_key_is_none() {
        let cache: TtlCache<String, i32> = TtlCache::new();
        assert_eq!(cache.get(&"missing".to_string()), None);
    }
}
