//! Property tests for the read-only accept-list.

use narrata_core::errors::QueryExecutionErrorKind;
use narrata_store::guard;
use proptest::prelude::*;

fn mutating_statement() -> impl Strategy<Value = String> {
    let table = "[a-z][a-z_]{0,10}";
    prop_oneof![
        table.prop_map(|t| format!("DELETE FROM {t}")),
        table.prop_map(|t| format!("DROP TABLE {t}")),
        (table, 0i64..10_000).prop_map(|(t, v)| format!("UPDATE {t} SET value = {v}")),
        (table, 0i64..10_000).prop_map(|(t, v)| format!("INSERT INTO {t} (value) VALUES ({v})")),
        table.prop_map(|t| format!("CREATE TABLE {t} (x INTEGER)")),
        table.prop_map(|t| format!("ALTER TABLE {t} ADD COLUMN y TEXT")),
    ]
}

fn casing(sql: String, lower: bool) -> String {
    if lower {
        sql.to_lowercase()
    } else {
        sql
    }
}

proptest! {
    #[test]
    fn mutating_statements_never_admitted(sql in mutating_statement(), lower in any::<bool>()) {
        let sql = casing(sql, lower);
        let err = guard::check(&sql).unwrap_err();
        prop_assert_eq!(err.kind(), QueryExecutionErrorKind::PermissionDenied);
    }

    #[test]
    fn mutation_stacked_after_select_never_admitted(
        year in 1960i64..2030,
        tail in mutating_statement(),
    ) {
        let sql = format!("SELECT value FROM wdi WHERE year = {year}; {tail}");
        prop_assert!(guard::check(&sql).is_err());
    }

    #[test]
    fn simple_selects_admitted(
        year in 1960i64..2030,
        limit in 1u32..500,
        iso in "[A-Z]{3}",
    ) {
        let sql = format!(
            "SELECT year, value FROM wdi WHERE country_iso3 = '{iso}' AND year >= {year} ORDER BY year LIMIT {limit}"
        );
        prop_assert!(guard::check(&sql).is_ok());
    }
}
