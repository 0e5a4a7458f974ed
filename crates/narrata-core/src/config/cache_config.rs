use serde::{Deserialize, Serialize};

use super::defaults;

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Location of the persistent cache database. `None` keeps the cache in memory only.
    pub path: Option<String>,
    /// In-memory tier capacity when a persistent tier backs it.
    pub l1_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            l1_capacity: defaults::DEFAULT_L1_CAPACITY,
        }
    }
}
