use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Data store adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database holding the dataset.
    pub db_path: String,
    /// Table queried by the pipeline.
    pub table: String,
    /// Number of read connections in the pool.
    pub read_pool_size: usize,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Columns shown to the model. Empty means every column of the table.
    pub exposed_columns: Vec<String>,
    /// Human descriptions per column, embedded in the schema prompt.
    pub column_descriptions: BTreeMap<String, String>,
    /// Indicator code to human-readable name.
    pub indicator_names: BTreeMap<String, String>,
    /// Short description of the dataset for the synthesis prompt.
    pub dataset_description: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::DEFAULT_DB_FILENAME.to_string(),
            table: defaults::DEFAULT_TABLE.to_string(),
            read_pool_size: defaults::DEFAULT_READ_POOL_SIZE,
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
            exposed_columns: Vec::new(),
            column_descriptions: BTreeMap::new(),
            indicator_names: BTreeMap::new(),
            dataset_description: defaults::DEFAULT_DATASET_DESCRIPTION.to_string(),
        }
    }
}
