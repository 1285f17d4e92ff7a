//! Capacity- and time-bounded in-memory cache for analysis results.
//!
//! Entries expire a fixed TTL after insertion and are dropped lazily when
//! read. When full, the oldest-inserted entry is evicted (FIFO, not LRU):
//! reads never change eviction order.

use crate::clock::{Clock, SystemClock};
use crate::utils::fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_ENTRIES: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: DEFAULT_MAX_ENTRIES, ttl_ms: DEFAULT_TTL.as_millis() as u64 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub ttl_ms: u64,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
    /// Insertion sequence number, the key into `CacheState::order`.
    seq: u64,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl<V> CacheState<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

pub struct AnalysisCache<V> {
    config: CacheConfig,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState<V>>,
}

impl<V: Clone> AnalysisCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            ttl: Duration::from_millis(config.ttl_ms),
            clock,
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Cache key for a source locator at a content version. Case-insensitive
    /// on the locator, fixed length regardless of input.
    pub fn generate_key(locator: &str, version: &str) -> String {
        fingerprint(locator, version)
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<V>> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<V>> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Value for `key`, or `None` if absent or expired. Expired entries are
    /// removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let state = self.read();
            match state.entries.get(key) {
                None => return None,
                Some(entry) if now < entry.expires_at => {
                    let age_ms = now.duration_since(entry.inserted_at).as_millis() as u64;
                    tracing::debug!(key, age_ms, "cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: another writer may have replaced it.
        let mut state = self.write();
        if state.entries.get(key).is_some_and(|entry| now >= entry.expires_at) {
            state.remove(key);
            tracing::debug!(key, "cache entry expired");
        }
        None
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace `key`. Replacing refreshes the TTL and makes the key
    /// the newest entry. At capacity, the oldest-inserted entry is evicted
    /// first.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now();
        let mut state = self.write();

        if state.remove(&key).is_none() {
            while state.entries.len() >= self.config.max_entries.max(1) {
                match state.evict_oldest() {
                    Some(evicted) => tracing::debug!(key = %evicted, "cache full, evicted oldest entry"),
                    None => break,
                }
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.insert(seq, key.clone());
        state.entries.insert(key, CacheEntry { value, inserted_at: now, expires_at: now + self.ttl, seq });
    }

    pub fn delete(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.entries.clear();
        state.order.clear();
    }

    /// Current size counts entries that have expired but not yet been read.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.read().entries.len(),
            max_entries: self.config.max_entries,
            ttl_ms: self.config.ttl_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    struct Data {
        data: String,
    }

    fn data(text: &str) -> Data {
        Data { data: text.to_string() }
    }

    fn cache() -> AnalysisCache<Data> {
        AnalysisCache::new(CacheConfig { max_entries: 3, ttl_ms: 1000 })
    }

    #[test]
    fn test_generate_key_is_stable_and_case_insensitive() {
        let a = AnalysisCache::<Data>::generate_key("https://github.com/user/repo", "abc123");
        let b = AnalysisCache::<Data>::generate_key("https://github.com/user/repo", "abc123");
        let upper = AnalysisCache::<Data>::generate_key("https://GitHub.com/User/Repo", "abc123");
        assert_eq!(a, b);
        assert_eq!(a, upper);
    }

    #[test]
    fn test_generate_key_distinguishes_repo_and_version() {
        let base = AnalysisCache::<Data>::generate_key("https://github.com/user/repo1", "abc123");
        let other_repo = AnalysisCache::<Data>::generate_key("https://github.com/user/repo2", "abc123");
        let other_commit = AnalysisCache::<Data>::generate_key("https://github.com/user/repo1", "def456");
        assert_ne!(base, other_repo);
        assert_ne!(base, other_commit);
    }

    #[test]
    fn test_set_get_overwrite() {
        let cache = cache();
        assert_eq!(cache.get("nonexistent"), None);
        cache.set("key1", data("value1"));
        assert_eq!(cache.get("key1"), Some(data("value1")));
        cache.set("key1", data("value2"));
        assert_eq!(cache.get("key1"), Some(data("value2")));
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn test_has_and_delete() {
        let cache = cache();
        cache.set("key1", data("value1"));
        assert!(cache.has("key1"));
        assert!(!cache.has("nonexistent"));
        assert!(cache.delete("key1"));
        assert!(!cache.has("key1"));
        assert!(!cache.delete("key1"));
    }

    #[test]
    fn test_evicts_oldest_inserted_at_capacity() {
        let cache = cache();
        cache.set("key1", data("value1"));
        cache.set("key2", data("value2"));
        cache.set("key3", data("value3"));
        // Reading key1 does not protect it: eviction is by insertion order.
        assert!(cache.has("key1"));
        cache.set("key4", data("value4"));

        assert_eq!(cache.stats().size, 3);
        assert!(cache.has("key4"));
        assert!(!cache.has("key1"));
        assert!(cache.has("key2"));
    }

    #[test]
    fn test_overwrite_moves_key_to_newest() {
        let cache = cache();
        cache.set("key1", data("value1"));
        cache.set("key2", data("value2"));
        cache.set("key3", data("value3"));
        cache.set("key1", data("again"));
        cache.set("key4", data("value4"));

        assert!(cache.has("key1"));
        assert!(!cache.has("key2"));
    }

    #[test]
    fn test_ttl_with_manual_clock() {
        let clock = Arc::new(ManualClock::new());
        let cache = AnalysisCache::with_clock(CacheConfig { max_entries: 10, ttl_ms: 50 }, clock.clone());
        cache.set("key1", data("value1"));

        clock.advance(Duration::from_millis(49));
        assert_eq!(cache.get("key1"), Some(data("value1")));

        clock.advance(Duration::from_millis(11));
        assert_eq!(cache.get("key1"), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_ttl_with_system_clock() {
        let cache = AnalysisCache::new(CacheConfig { max_entries: 10, ttl_ms: 50 });
        cache.set("key1", data("value1"));
        assert_eq!(cache.get("key1"), Some(data("value1")));

        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get("key1"), None);
    }

    #[test]
    fn test_clear_and_stats() {
        let cache = cache();
        cache.set("key1", data("value1"));
        assert_eq!(cache.stats(), CacheStats { size: 1, max_entries: 3, ttl_ms: 1000 });
        cache.set("key2", data("value2"));
        cache.clear();
        assert!(!cache.has("key1"));
        assert!(!cache.has("key2"));
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_concurrent_writers_respect_capacity() {
        let cache = Arc::new(AnalysisCache::new(CacheConfig { max_entries: 8, ttl_ms: 60_000 }));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..50 {
                        cache.set(format!("t{t}-{i}"), data("v"));
                        let _ = cache.get(&format!("t{t}-{}", i / 2));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.stats().size, 8);
    }
}
