//! Runs a synthesized query against the store with the row cap applied.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use narrata_core::constants::MAX_RANKED_SCAN_ROWS;
use narrata_core::errors::QueryExecutionError;
use narrata_core::models::{QueryResult, SynthesizedQuery};
use narrata_core::traits::{ExecutionOptions, IDataStore};

pub struct QueryExecutor {
    store: Arc<dyn IDataStore>,
    max_rows: usize,
    timeout: Duration,
    drop_empty_columns: bool,
}

impl QueryExecutor {
    pub fn new(
        store: Arc<dyn IDataStore>,
        max_rows: usize,
        timeout: Duration,
        drop_empty_columns: bool,
    ) -> Self {
        Self {
            store,
            max_rows,
            timeout,
            drop_empty_columns,
        }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Never returns more than `max_rows` rows; `truncated` is set when more matched.
    /// When rows must be dropped, the most recent years are kept.
    pub fn run(&self, query: &SynthesizedQuery) -> Result<QueryResult, QueryExecutionError> {
        // Over-fetch so ranking sees more than the first `max_rows` in query order.
        let options = ExecutionOptions {
            max_rows: Some(MAX_RANKED_SCAN_ROWS.max(self.max_rows)),
            timeout: Some(self.timeout),
        };
        let mut result = self.store.execute(&query.text, &query.bindings, &options)?;
        // Adapters are not trusted to honour max_rows.
        result.truncate_keeping_latest(self.max_rows);
        if self.drop_empty_columns {
            result.drop_empty_columns();
        }
        debug!(
            store = self.store.name(),
            rows = result.row_count(),
            truncated = result.truncated,
            "query executed"
        );
        Ok(result)
    }
}
