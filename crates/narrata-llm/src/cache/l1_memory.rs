//! L1 in-memory response cache using moka.

use moka::sync::Cache;

use narrata_core::models::CacheEntry;

/// L1 in-memory cache keyed by fingerprint hex.
///
/// Without a persistent tier behind it the cache is unbounded, so nothing is
/// ever evicted. With one, it is a bounded front for hot entries.
pub struct L1MemoryCache {
    cache: Cache<String, CacheEntry>,
}

impl L1MemoryCache {
    pub fn unbounded() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }

    pub fn bounded(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        self.cache.get(fingerprint)
    }

    /// Insert unless an entry already exists; the first writer wins.
    pub fn insert_if_absent(&self, entry: CacheEntry) {
        let key = entry.fingerprint.as_str().to_string();
        self.cache.entry(key).or_insert(entry);
    }

    pub fn remove(&self, fingerprint: &str) -> bool {
        self.cache.remove(fingerprint).is_some()
    }

    /// Approximate entry count (moka applies writes lazily).
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
