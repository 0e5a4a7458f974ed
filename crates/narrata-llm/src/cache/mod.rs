//! Two-tier response cache.
//!
//! L1 (moka in-memory) → L2 (SQLite persistent). Lookups promote L2 hits into
//! L1; writes go to L2 first, then L1. A storage failure is logged and treated
//! as a miss: the cache never fails a run.

pub mod l1_memory;
pub mod l2_sqlite;

pub use l1_memory::L1MemoryCache;
pub use l2_sqlite::L2SqliteCache;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use narrata_core::config::CacheConfig;
use narrata_core::errors::CacheError;
use narrata_core::models::{CacheEntry, Fingerprint};
use narrata_core::traits::IResponseCache;

/// Tier that answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHitTier {
    L1,
    L2,
    Miss,
}

/// Hit/miss counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct ResponseCache {
    l1: L1MemoryCache,
    l2: Option<L2SqliteCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Memory-only cache. Unbounded, lives as long as the process.
    pub fn in_memory() -> Self {
        Self::with_tiers(L1MemoryCache::unbounded(), None)
    }

    /// Persistent cache at `path` with a bounded L1 in front.
    pub fn open(path: &Path, l1_capacity: u64) -> Result<Self, CacheError> {
        let l2 = L2SqliteCache::open(path)?;
        Ok(Self::with_tiers(L1MemoryCache::bounded(l1_capacity), Some(l2)))
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        match &config.path {
            Some(path) => {
                let cache = Self::open(Path::new(path), config.l1_capacity)?;
                info!(path = %path, l1_capacity = config.l1_capacity, "response cache opened");
                Ok(cache)
            }
            None => {
                info!("response cache is memory-only");
                Ok(Self::in_memory())
            }
        }
    }

    fn with_tiers(l1: L1MemoryCache, l2: Option<L2SqliteCache>) -> Self {
        Self {
            l1,
            l2,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up an entry across both tiers, reporting which one answered.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> (Option<CacheEntry>, CacheHitTier) {
        let key = fingerprint.as_str();

        if let Some(entry) = self.l1.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = fingerprint.short(), tier = "L1", "cache hit");
            return (Some(entry), CacheHitTier::L1);
        }

        if let Some(l2) = &self.l2 {
            match l2.get(key) {
                Ok(Some(entry)) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(fingerprint = fingerprint.short(), tier = "L2", "cache hit");
                    self.l1.insert_if_absent(entry.clone());
                    return (Some(entry), CacheHitTier::L2);
                }
                Ok(None) => {}
                Err(e) => warn!(fingerprint = fingerprint.short(), error = %e, "L2 lookup failed, treating as miss"),
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        (None, CacheHitTier::Miss)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Whether a persistent tier backs this cache.
    pub fn is_persistent(&self) -> bool {
        self.l2.is_some()
    }

    /// Persisted entries per task label. Empty for a memory-only cache.
    pub fn persisted_by_task(&self) -> Result<Vec<(String, u64)>, CacheError> {
        match &self.l2 {
            Some(l2) => l2.count_by_task(),
            None => Ok(Vec::new()),
        }
    }
}

impl IResponseCache for ResponseCache {
    fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        self.lookup(fingerprint).0
    }

    fn put(&self, entry: CacheEntry) {
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.insert(&entry) {
                warn!(fingerprint = entry.fingerprint.short(), error = %e, "L2 insert failed");
            }
        }
        self.l1.insert_if_absent(entry);
    }

    fn delete(&self, fingerprint: &Fingerprint) -> bool {
        let in_l1 = self.l1.remove(fingerprint.as_str());
        let in_l2 = match &self.l2 {
            Some(l2) => l2.delete(fingerprint.as_str()).unwrap_or_else(|e| {
                warn!(fingerprint = fingerprint.short(), error = %e, "L2 delete failed");
                false
            }),
            None => false,
        };
        in_l1 || in_l2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fp: &str, text: &str) -> CacheEntry {
        CacheEntry::new(Fingerprint::from_hex(fp), text, "gpt-4o-mini", "sql_synthesis")
    }

    fn persistent() -> ResponseCache {
        ResponseCache::with_tiers(
            L1MemoryCache::bounded(100),
            Some(L2SqliteCache::open_in_memory().unwrap()),
        )
    }

    #[test]
    fn miss_on_empty() {
        let cache = ResponseCache::in_memory();
        let (entry, tier) = cache.lookup(&Fingerprint::from_hex("nope"));
        assert!(entry.is_none());
        assert_eq!(tier, CacheHitTier::Miss);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1 });
    }

    #[test]
    fn put_then_l1_hit() {
        let cache = persistent();
        cache.put(entry("fp1", "SELECT 1"));
        let (got, tier) = cache.lookup(&Fingerprint::from_hex("fp1"));
        assert_eq!(got.unwrap().text, "SELECT 1");
        assert_eq!(tier, CacheHitTier::L1);
    }

    #[test]
    fn l2_hit_promotes_to_l1() {
        let cache = persistent();
        if let Some(l2) = &cache.l2 {
            l2.insert(&entry("fp2", "narrative")).unwrap();
        }
        let fp = Fingerprint::from_hex("fp2");
        assert_eq!(cache.lookup(&fp).1, CacheHitTier::L2);
        assert_eq!(cache.lookup(&fp).1, CacheHitTier::L1);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn delete_clears_both_tiers() {
        let cache = persistent();
        cache.put(entry("fp3", "x"));
        assert!(cache.delete(&Fingerprint::from_hex("fp3")));
        assert_eq!(cache.lookup(&Fingerprint::from_hex("fp3")).1, CacheHitTier::Miss);
        assert!(!cache.delete(&Fingerprint::from_hex("fp3")));
    }

    #[test]
    fn hit_rate() {
        let stats = CacheStats { hits: 3, misses: 1 };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
