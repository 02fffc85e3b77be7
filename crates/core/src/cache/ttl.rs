use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

use super::CacheConfig;
use crate::metrics;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_stale(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// On-demand cache statistics.
///
/// `expired` is judged against the default TTL, not per-entry overrides.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub keys: Vec<String>,
}

/// In-memory key/value cache with per-entry expiry.
///
/// Bookkeeping sits behind one mutex; fetches run under per-key locks,
/// so a slow fetch for one key never serializes lookups of another,
/// while at most one fetch per key can be in flight.
pub struct TtlCache {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    fetch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TtlCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            default_ttl: config.default_ttl(),
            entries: Mutex::new(HashMap::new()),
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, computing it with `fetch` on a
    /// miss or after expiry.
    ///
    /// If `fetch` fails and a stale previous value exists, the stale
    /// value is served instead of the error; with no previous value the
    /// error propagates.
    pub fn get_or_fetch<T, E, F>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        let ttl = ttl.unwrap_or(self.default_ttl);

        if let Some(value) = self.lookup::<T>(key, true) {
            metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            return Ok(value);
        }

        let key_lock = {
            let mut locks = self.fetch_locks.lock().unwrap();
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        let _fetching = key_lock.lock().unwrap();

        // Another caller may have populated the key while we waited.
        if let Some(value) = self.lookup::<T>(key, true) {
            metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            return Ok(value);
        }

        metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
        match fetch() {
            Ok(value) => {
                let value = Arc::new(value);
                self.store(key, value.clone(), ttl);
                Ok(value)
            }
            Err(e) => {
                if let Some(stale) = self.lookup::<T>(key, false) {
                    warn!(key, "cache fetch failed, serving stale value");
                    metrics::CACHE_LOOKUPS
                        .with_label_values(&["stale_fallback"])
                        .inc();
                    Ok(stale)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Return a live cached value without computing anything.
    pub fn peek<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.lookup::<T>(key, true)
    }

    /// Unconditional overwrite.
    pub fn set<T: Any + Send + Sync>(&self, key: &str, value: T, ttl: Option<Duration>) {
        self.store(key, Arc::new(value), ttl.unwrap_or(self.default_ttl));
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    /// Remove every entry whose key contains `pattern` as a substring.
    /// Returns the number of entries removed.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        before - entries.len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Scan timestamps and report totals. Computed on demand.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap();
        let now = Instant::now();
        let expired = entries
            .values()
            .filter(|entry| now.duration_since(entry.inserted_at) >= self.default_ttl)
            .count();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            total: entries.len(),
            active: entries.len() - expired,
            expired,
            keys,
        }
    }

    fn lookup<T: Any + Send + Sync>(&self, key: &str, live_only: bool) -> Option<Arc<T>> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if live_only && entry.is_stale(Instant::now()) {
            return None;
        }
        Arc::clone(&entry.value).downcast::<T>().ok()
    }

    fn store<T: Any + Send + Sync>(&self, key: &str, value: Arc<T>, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }
}
