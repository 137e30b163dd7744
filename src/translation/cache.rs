/*!
 * Translation caching functionality.
 *
 * This module provides an in-memory, fixed-capacity cache with a time-to-live
 * to avoid redundant API calls for texts that were translated recently.
 *
 * Eviction is least-recently-used: inserting into a full cache drops the entry
 * that was inserted or successfully read longest ago. Expired entries are
 * removed lazily, when a lookup finds them.
 */

use log::debug;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// A cached translation and its insertion time
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

/// Translation cache for storing and retrieving translations
///
/// Clones share the same storage and counters.
#[derive(Debug, Clone)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<Mutex<LruCache<String, CacheEntry>>>,

    /// How long an entry stays valid after insertion
    ttl: Duration,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl TranslationCache {
    /// Create a new translation cache holding at most `capacity` entries
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Build the cache key for a text and language pair
    pub fn key_for(source_language: &str, target_language: &str, source_text: &str) -> String {
        format!("{}:{}:{}", source_language, target_language, source_text)
    }

    /// Get a translation from the cache
    ///
    /// Returns `None` when the key is absent or its entry has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut cache = self.cache.lock();

        let lookup = cache
            .get(key)
            .map(|entry| (entry.is_fresh(self.ttl), entry.value.clone()));

        match lookup {
            Some((true, value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}'", truncate_text(key, 40));
                Some(value)
            }
            Some((false, _)) => {
                cache.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache entry expired for '{}'", truncate_text(key, 40));
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a translation in the cache, restarting its time-to-live
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut cache = self.cache.lock();

        if let Some((evicted, _)) = cache.push(
            key.clone(),
            CacheEntry {
                value: value.into(),
                inserted_at: Instant::now(),
            },
        ) {
            if evicted != key {
                debug!("Cache full, evicted '{}'", truncate_text(&evicted, 40));
            }
        }
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache and reset its counters
    pub fn clear(&self) {
        self.cache.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Translation cache cleared");
    }

    /// Number of stored entries, including expired ones not yet looked up
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
