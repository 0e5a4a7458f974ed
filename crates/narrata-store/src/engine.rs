//! SqliteDataStore: owns the read pool and the loaded schema, implements
//! IDataStore.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use tracing::{debug, info, warn};

use narrata_core::config::StoreConfig;
use narrata_core::errors::{NarrataResult, QueryExecutionError};
use narrata_core::models::{QueryResult, Row, ScalarValue, SchemaDescriptor};
use narrata_core::traits::{ExecutionOptions, IDataStore};

use crate::convert::{from_value_ref, to_sql_value};
use crate::errors::{to_query_err, to_store_err};
use crate::guard;
use crate::pool::ReadPool;
use crate::schema::{build_descriptor, quote_ident, table_columns};

/// VM instructions between deadline checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// Read-only adapter over one table of a SQLite database.
pub struct SqliteDataStore {
    pool: ReadPool,
    schema: Arc<SchemaDescriptor>,
    name: String,
}

impl SqliteDataStore {
    /// Open the database read-only and load the schema of the configured table.
    pub fn open(config: &StoreConfig) -> NarrataResult<Self> {
        let pool = ReadPool::open(
            Path::new(&config.db_path),
            config.read_pool_size,
            config.busy_timeout_ms,
        )?;
        let raw = pool
            .with_conn(|conn| {
                table_columns(conn, &config.table)
                    .map_err(|e| to_query_err(&e, Duration::ZERO))
            })
            .map_err(to_store_err)?;
        let schema = build_descriptor(config, raw)?;
        info!(
            db = %config.db_path,
            table = %config.table,
            columns = schema.columns().len(),
            pool_size = pool.size(),
            "data store opened"
        );
        Ok(Self {
            pool,
            name: format!("sqlite:{}", config.table),
            schema: Arc::new(schema),
        })
    }

    /// The read pool (for diagnostics).
    pub fn pool(&self) -> &ReadPool {
        &self.pool
    }
}

impl IDataStore for SqliteDataStore {
    fn describe_schema(&self) -> Arc<SchemaDescriptor> {
        Arc::clone(&self.schema)
    }

    fn sample_rows(
        &self,
        limit: usize,
        timeout: Option<Duration>,
    ) -> Result<QueryResult, QueryExecutionError> {
        let columns: Vec<String> = self
            .schema
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        if limit == 0 {
            return Ok(QueryResult {
                columns,
                ..Default::default()
            });
        }
        let projection = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {projection} FROM {} LIMIT {limit}",
            quote_ident(self.schema.table())
        );
        let started = Instant::now();
        self.pool.with_conn(|conn| {
            with_deadline(conn, started, timeout, || {
                fetch(conn, &sql, &BTreeMap::new(), None, started)
            })
        })
    }

    fn execute(
        &self,
        query: &str,
        bindings: &BTreeMap<String, ScalarValue>,
        options: &ExecutionOptions,
    ) -> Result<QueryResult, QueryExecutionError> {
        if let Err(e) = guard::check(query) {
            warn!(error = %e, "query rejected by accept-list");
            return Err(e);
        }
        let started = Instant::now();
        let result = self.pool.with_conn(|conn| {
            with_deadline(conn, started, options.timeout, || {
                fetch(conn, query, bindings, options.max_rows, started)
            })
        });
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(r) => debug!(rows = r.row_count(), truncated = r.truncated, elapsed_ms, "query executed"),
            Err(e) => warn!(error = %e, elapsed_ms, "query failed"),
        }
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Install an interrupting progress handler for the duration of `f`.
///
/// The deadline counts from `started`, the moment the call arrived, so time
/// spent waiting for a connection is part of the budget.
fn with_deadline<T>(
    conn: &Connection,
    started: Instant,
    timeout: Option<Duration>,
    f: impl FnOnce() -> Result<T, QueryExecutionError>,
) -> Result<T, QueryExecutionError> {
    let Some(timeout) = timeout else {
        return f();
    };
    let deadline = started + timeout;
    if Instant::now() >= deadline {
        return Err(QueryExecutionError::Timeout {
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
    }
    conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || Instant::now() >= deadline));
    let result = f();
    conn.progress_handler(0, None::<fn() -> bool>);
    result
}

/// Prepare, bind, and step a statement, keeping at most `max_rows` rows.
fn fetch(
    conn: &Connection,
    sql: &str,
    bindings: &BTreeMap<String, ScalarValue>,
    max_rows: Option<usize>,
    started: Instant,
) -> Result<QueryResult, QueryExecutionError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_query_err(&e, started.elapsed()))?;
    if !stmt.readonly() {
        return Err(QueryExecutionError::PermissionDenied {
            reason: "statement would modify the database".to_string(),
        });
    }

    for index in 1..=stmt.parameter_count() {
        let name = stmt.parameter_name(index).map(str::to_owned);
        let Some(name) = name else {
            return Err(QueryExecutionError::SyntaxInvalid {
                reason: format!("positional parameter {index} cannot be bound; use named parameters"),
            });
        };
        let key = name.trim_start_matches([':', '@', '$']);
        let value = bindings
            .get(key)
            .ok_or_else(|| QueryExecutionError::SyntaxInvalid {
                reason: format!("parameter {name} is not bound"),
            })?;
        stmt.raw_bind_parameter(index, to_sql_value(value))
            .map_err(|e| to_query_err(&e, started.elapsed()))?;
    }

    let columns = unique_column_names(&stmt.column_names());
    let mut rows = stmt.raw_query();
    let mut out = Vec::new();
    let mut truncated = false;
    while let Some(row) = rows.next().map_err(|e| to_query_err(&e, started.elapsed()))? {
        if max_rows.is_some_and(|max| out.len() >= max) {
            truncated = true;
            break;
        }
        let mut record = Row::new();
        for (i, column) in columns.iter().enumerate() {
            let value = row
                .get_ref(i)
                .map_err(|e| to_query_err(&e, started.elapsed()))?;
            record.insert(column.clone(), from_value_ref(value));
        }
        out.push(record);
    }

    Ok(QueryResult {
        columns,
        rows: out,
        truncated,
    })
}

/// Result column names with duplicates suffixed (`value`, `value_2`, ...),
/// so every column survives the name-keyed row map.
fn unique_column_names(names: &[&str]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .map(|name| {
            let mut candidate = (*name).to_string();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{name}_{n}");
                n += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::unique_column_names;

    #[test]
    fn duplicate_columns_are_suffixed() {
        assert_eq!(
            unique_column_names(&["year", "value", "value", "value"]),
            vec!["year", "value", "value_2", "value_3"]
        );
    }
}
