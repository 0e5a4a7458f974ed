use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::ScalarValue;
use crate::constants::{COUNTRY_COLUMN, YEAR_COLUMN};

/// A result row: column name to scalar value.
pub type Row = BTreeMap<String, ScalarValue>;

/// Rows returned by a successful execution.
///
/// An empty `rows` vector means the query ran and matched nothing; failures are
/// reported as errors and never produce a `QueryResult`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in the order the query produced them.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// More rows matched than were kept.
    pub truncated: bool,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value at `row` / `column`, if present.
    pub fn value(&self, row: usize, column: &str) -> Option<&ScalarValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Keep at most `max_rows` rows, flagging truncation when rows were dropped.
    pub fn truncate_to(&mut self, max_rows: usize) {
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            self.truncated = true;
        }
    }

    /// Keep at most `max_rows` rows, preferring the most recent ones.
    ///
    /// When the result has a `year` column, rows are ranked by year then
    /// country, both descending, nulls last; the top `max_rows` survive in
    /// their original query order. Without a `year` column this is
    /// [`truncate_to`](Self::truncate_to).
    pub fn truncate_keeping_latest(&mut self, max_rows: usize) {
        if self.rows.len() <= max_rows {
            return;
        }
        if !self.columns.iter().any(|c| c == YEAR_COLUMN) {
            self.truncate_to(max_rows);
            return;
        }
        let mut ranked: Vec<usize> = (0..self.rows.len()).collect();
        ranked.sort_by(|&a, &b| {
            let (ra, rb) = (&self.rows[a], &self.rows[b]);
            descending(ra.get(YEAR_COLUMN), rb.get(YEAR_COLUMN))
                .then_with(|| descending(ra.get(COUNTRY_COLUMN), rb.get(COUNTRY_COLUMN)))
        });
        let mut keep = vec![false; self.rows.len()];
        for &i in ranked.iter().take(max_rows) {
            keep[i] = true;
        }
        let mut index = 0;
        self.rows.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
        self.truncated = true;
    }

    /// Remove columns that are null in every row. No-op on an empty result.
    pub fn drop_empty_columns(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let empty: Vec<String> = self
            .columns
            .iter()
            .filter(|col| {
                self.rows
                    .iter()
                    .all(|row| row.get(col.as_str()).map_or(true, ScalarValue::is_null))
            })
            .cloned()
            .collect();
        if empty.is_empty() {
            return;
        }
        self.columns.retain(|c| !empty.contains(c));
        for row in &mut self.rows {
            for col in &empty {
                row.remove(col);
            }
        }
    }
}

/// Descending order for ranking, nulls and absent values last.
/// Numbers compare numerically, text lexically, numbers before text.
fn descending(a: Option<&ScalarValue>, b: Option<&ScalarValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.as_str().cmp(&a.as_str()),
        },
    }
}
