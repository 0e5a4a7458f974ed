//! Property tests: the executor never passes on more rows than its cap,
//! whatever the store returns, and the rows it keeps are the most recent.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use narrata_core::errors::QueryExecutionError;
use narrata_core::models::{
    ColumnDef, Fingerprint, QueryResult, Row, ScalarValue, SchemaDescriptor, SemanticType,
    SynthesizedQuery,
};
use narrata_core::traits::{ExecutionOptions, IDataStore};
use narrata_pipeline::executor::QueryExecutor;

/// Returns one row per entry of `years` no matter what limit it is given.
struct UncappedStore {
    years: Vec<i64>,
}

impl UncappedStore {
    fn ascending(rows: usize) -> Self {
        Self {
            years: (0..rows).map(|i| 2000 + i as i64).collect(),
        }
    }
}

impl IDataStore for UncappedStore {
    fn describe_schema(&self) -> Arc<SchemaDescriptor> {
        Arc::new(SchemaDescriptor::new(
            "t",
            vec![ColumnDef {
                name: "year".into(),
                semantic_type: SemanticType::Integer,
                description: None,
            }],
        ))
    }

    fn sample_rows(
        &self,
        _limit: usize,
        _timeout: Option<Duration>,
    ) -> Result<QueryResult, QueryExecutionError> {
        Ok(QueryResult::default())
    }

    fn execute(
        &self,
        _query: &str,
        _bindings: &BTreeMap<String, ScalarValue>,
        _options: &ExecutionOptions,
    ) -> Result<QueryResult, QueryExecutionError> {
        let rows = self
            .years
            .iter()
            .map(|&year| {
                let mut row = Row::new();
                row.insert("year".into(), ScalarValue::Integer(year));
                row
            })
            .collect();
        Ok(QueryResult {
            columns: vec!["year".into()],
            rows,
            truncated: false,
        })
    }

    fn name(&self) -> &str {
        "uncapped"
    }
}

fn query() -> SynthesizedQuery {
    SynthesizedQuery {
        text: "SELECT year FROM t".into(),
        bindings: BTreeMap::new(),
        fingerprint: Fingerprint::from_hex("00"),
        cache_hit: false,
    }
}

proptest! {
    #[test]
    fn rows_never_exceed_cap(rows in 0usize..200, cap in 1usize..100) {
        let executor = QueryExecutor::new(
            Arc::new(UncappedStore::ascending(rows)),
            cap,
            Duration::from_secs(1),
            true,
        );
        let result = executor.run(&query()).unwrap();
        prop_assert!(result.row_count() <= cap);
        prop_assert_eq!(result.row_count(), rows.min(cap));
        prop_assert_eq!(result.truncated, rows > cap);
    }

    #[test]
    fn capped_rows_are_the_most_recent(
        years in prop::collection::vec(1990i64..2025, 0..200),
        cap in 1usize..50,
    ) {
        let executor = QueryExecutor::new(
            Arc::new(UncappedStore { years: years.clone() }),
            cap,
            Duration::from_secs(1),
            true,
        );
        let result = executor.run(&query()).unwrap();
        let kept: Vec<i64> = result
            .rows
            .iter()
            .map(|row| match row.get("year") {
                Some(ScalarValue::Integer(y)) => *y,
                other => panic!("unexpected year {other:?}"),
            })
            .collect();

        let mut expected = years.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.truncate(cap);
        let mut sorted_kept = kept.clone();
        sorted_kept.sort_unstable_by(|a, b| b.cmp(a));
        prop_assert_eq!(sorted_kept, expected);

        // Survivors keep the order the store returned them in.
        let mut cursor = years.iter();
        for year in &kept {
            prop_assert!(cursor.any(|y| y == year));
        }
    }
}
