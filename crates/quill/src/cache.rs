//! Bounded caches shared across `process` calls.
//!
//! Both caches sit behind a mutex so concurrent callers never observe a
//! half-evicted map. When an insert pushes a cache past its capacity, the
//! oldest tenth of the entries is evicted in one batch.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use camino::Utf8PathBuf;
use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::action::Action;
use crate::paths::NormalizedPath;

const CACHE_TARGET: &str = "quill::cache";

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries removed to make room.
    pub evictions: u64,
    /// Entries currently held.
    pub len: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

/// Mutex-guarded map with insertion-order batch eviction.
#[derive(Debug)]
pub struct BoundedCache<K: Hash + Eq, V> {
    name: &'static str,
    capacity: usize,
    entries: Mutex<LruCache<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// Creates a cache that holds at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            entries: Mutex::new(LruCache::unbounded()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Returns a clone of the entry for `key`.
    ///
    /// Lookups do not refresh an entry's age.
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.lock().peek(key).cloned();
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Stores `value` under `key`, evicting a batch of the oldest entries
    /// when the cache overflows.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.lock();
        entries.put(key, value);
        if entries.len() <= self.capacity {
            return;
        }

        let batch = self
            .capacity
            .div_ceil(10)
            .max(entries.len() - self.capacity);
        let mut evicted = 0_u64;
        for _ in 0..batch {
            if entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        drop(entries);
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
        debug!(target: CACHE_TARGET, cache = self.name, evicted, "evicted cache batch");
    }

    /// Returns the number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Returns current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            len: self.len(),
            capacity: self.capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// SHA-256 digest of a full input text.
pub type TextDigest = [u8; 32];

/// Hashes `text` into an [`ActionCache`] key.
#[must_use]
pub fn digest_text(text: &str) -> TextDigest {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

/// Extracted actions keyed by the digest of their source text.
pub type ActionCache = BoundedCache<TextDigest, Arc<Vec<Action>>>;

/// Normalised paths keyed by raw path and workspace root.
pub type PathCache = BoundedCache<(String, Utf8PathBuf), NormalizedPath>;

/// Counters for both pipeline caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCacheStats {
    /// Action cache counters.
    pub actions: CacheStats,
    /// Path cache counters.
    pub paths: CacheStats,
}
