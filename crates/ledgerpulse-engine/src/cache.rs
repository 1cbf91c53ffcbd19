//! Derived-result cache
//!
//! TTL- and version-tagged key/value store in front of the analyzer
//! and evaluator. Two entries with the same key but different version
//! are distinct generations; bumping the version readers ask for
//! invalidates a whole generation without scanning or deleting.
//!
//! The cache is a pure optimization: a call served from cache must be
//! semantically identical to recomputation. Any divergence is a
//! correctness bug, not a trade-off.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ledgerpulse_config::CacheConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{EngineError, EngineResult};

/// Version under which counter keys live
const COUNTER_VERSION: u64 = 0;

/// Key plus generation tag
type CacheKey = (String, u64);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Hit/miss/eviction telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// TTL and versioned key/value cache with per-key compute collapse
pub struct DerivedCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    compute_locks: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl DerivedCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            compute_locks: Mutex::new(HashMap::new()),
            default_ttl: Duration::from_secs(config.default_ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn effective_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or(self.default_ttl)
    }

    /// Store a value at a key and version
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>, version: u64) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.effective_ttl(ttl),
        };
        self.entries
            .lock()
            .unwrap()
            .insert((key.to_string(), version), entry);
    }

    /// Read a value; an expired entry reads as absent and is reclaimed.
    /// A different version is a miss.
    pub fn get(&self, key: &str, version: u64) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let cache_key = (key.to_string(), version);
        match entries.get(&cache_key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(&cache_key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Read a value, falling back to a default on a miss
    pub fn get_or(&self, key: &str, version: u64, default: Value) -> Value {
        self.get(key, version).unwrap_or(default)
    }

    /// Check presence without touching telemetry
    pub fn has(&self, key: &str, version: u64) -> bool {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap();
        entries
            .get(&(key.to_string(), version))
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Remove one generation of a key
    pub fn delete(&self, key: &str, version: u64) -> bool {
        self.entries
            .lock()
            .unwrap()
            .remove(&(key.to_string(), version))
            .is_some()
    }

    /// Live key names matching a glob pattern, deduplicated across
    /// versions and sorted
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let matcher = match glob::Pattern::new(pattern) {
            Ok(matcher) => matcher,
            Err(_) => return Vec::new(),
        };
        let now = Instant::now();
        let entries = self.entries.lock().unwrap();
        let names: BTreeSet<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .filter(|((name, _), _)| matcher.matches(name))
            .map(|((name, _), _)| name.clone())
            .collect();
        names.into_iter().collect()
    }

    /// Remove every generation of every key matching a glob pattern
    pub fn delete_matching(&self, pattern: &str) -> usize {
        let matcher = match glob::Pattern::new(pattern) {
            Ok(matcher) => matcher,
            Err(_) => return 0,
        };
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(name, _), _| !matcher.matches(name));
        before - entries.len()
    }

    /// Increment a counter key, creating it at zero. The counter's
    /// lifetime is refreshed on every operation.
    pub fn incr(&self, key: &str, delta: i64) -> i64 {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let cache_key = (key.to_string(), COUNTER_VERSION);
        let current = entries
            .get(&cache_key)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.value.as_i64())
            .unwrap_or(0);
        let next = current + delta;
        entries.insert(
            cache_key,
            CacheEntry {
                value: Value::from(next),
                expires_at: now + self.default_ttl,
            },
        );
        next
    }

    /// Decrement a counter key
    pub fn decr(&self, key: &str, delta: i64) -> i64 {
        self.incr(key, -delta)
    }

    /// Extend an entry's lifetime without recomputation
    pub fn touch(&self, key: &str, version: u64, ttl: Option<Duration>) -> bool {
        let now = Instant::now();
        let ttl = self.effective_ttl(ttl);
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(&(key.to_string(), version)) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = now + ttl;
                true
            }
            _ => false,
        }
    }

    /// Cache-aside entry point: return the cached value or run
    /// `compute` and store its result.
    ///
    /// Concurrent callers for the same key and version collapse to at
    /// most one compute in flight; the rest await it and read the
    /// stored result.
    pub async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        version: u64,
        ttl: Option<Duration>,
        compute: F,
    ) -> EngineResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        if let Some(value) = self.get(key, version) {
            return decode(value);
        }

        let lock = self.compute_lock(key, version);
        let _guard = lock.lock().await;

        // A caller ahead of us may have stored the result while we
        // waited for the lock
        if let Some(value) = self.get(key, version) {
            return decode(value);
        }

        let result = compute().await?;
        let value = serde_json::to_value(&result).map_err(|e| EngineError::Serialization {
            message: e.to_string(),
        })?;
        self.set(key, value, ttl, version);
        Ok(result)
    }

    fn compute_lock(&self, key: &str, version: u64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.compute_locks.lock().unwrap();
        locks
            .entry((key.to_string(), version))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop expired entries and idle compute locks; returns the number
    /// of entries reclaimed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            before - entries.len()
        };
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);

        let mut locks = self.compute_locks.lock().unwrap();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);

        removed
    }

    /// Telemetry snapshot
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.entries.lock().unwrap().len(),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> EngineResult<T> {
    serde_json::from_value(value).map_err(|e| EngineError::Serialization {
        message: e.to_string(),
    })
}

/// Short content hash for building cache-key fingerprints
pub fn short_hash(content: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let hash = hasher.finish();
    format!("{:016x}", hash)[..8].to_string()
}
