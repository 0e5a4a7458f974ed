use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::QueryExecutionError;
use crate::models::{QueryResult, ScalarValue, SchemaDescriptor};

/// Limits applied to one execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Keep at most this many rows and flag the result as truncated when more matched.
    pub max_rows: Option<usize>,
    /// Abort the statement once it has run this long.
    pub timeout: Option<Duration>,
}

/// Read-only access to the tabular dataset.
///
/// Implementations must refuse anything that is not a read-only query: the
/// query text comes from a generative model and is untrusted.
pub trait IDataStore: Send + Sync {
    /// Column catalog of the queried table. Loaded once, immutable afterwards.
    fn describe_schema(&self) -> Arc<SchemaDescriptor>;

    /// Up to `limit` rows of the exposed columns, for few-shot grounding.
    /// Aborted once `timeout` has passed since the call.
    fn sample_rows(
        &self,
        limit: usize,
        timeout: Option<Duration>,
    ) -> Result<QueryResult, QueryExecutionError>;

    /// Validate and run a query, binding named parameters from `bindings`.
    fn execute(
        &self,
        query: &str,
        bindings: &BTreeMap<String, ScalarValue>,
        options: &ExecutionOptions,
    ) -> Result<QueryResult, QueryExecutionError>;

    /// Human-readable adapter name.
    fn name(&self) -> &str;
}
