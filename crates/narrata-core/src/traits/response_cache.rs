use crate::models::{CacheEntry, Fingerprint};

/// Content-addressed store of completions.
///
/// Safe for concurrent use. There is no single-flight guarantee: two runs
/// missing on the same fingerprint may both call the model, and the first
/// `put` wins.
pub trait IResponseCache: Send + Sync {
    fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry>;

    /// Store an entry. An existing entry for the same fingerprint is kept as is.
    fn put(&self, entry: CacheEntry);

    /// Explicitly remove an entry. Returns whether anything was removed.
    fn delete(&self, fingerprint: &Fingerprint) -> bool;
}
