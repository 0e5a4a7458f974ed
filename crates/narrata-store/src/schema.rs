//! Table introspection into a [`SchemaDescriptor`].

use rusqlite::Connection;
use tracing::warn;

use narrata_core::config::StoreConfig;
use narrata_core::errors::StoreError;
use narrata_core::models::{ColumnDef, SchemaDescriptor, SemanticType};

/// A column as SQLite declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub declared_type: String,
}

/// Declared columns of `table`, in table order. Empty when the table does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<RawColumn>> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    let rows = stmt.query_map([table], |row| {
        Ok(RawColumn {
            name: row.get(0)?,
            declared_type: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Build the descriptor shown to the model.
///
/// With `exposed_columns` set, only those columns appear, in configured order;
/// names missing from the table are skipped with a warning.
pub fn build_descriptor(
    config: &StoreConfig,
    raw: Vec<RawColumn>,
) -> Result<SchemaDescriptor, StoreError> {
    if raw.is_empty() {
        return Err(StoreError::TableNotFound {
            table: config.table.clone(),
        });
    }

    let selected: Vec<RawColumn> = if config.exposed_columns.is_empty() {
        raw
    } else {
        config
            .exposed_columns
            .iter()
            .filter_map(|wanted| {
                let found = raw.iter().find(|c| c.name.eq_ignore_ascii_case(wanted));
                if found.is_none() {
                    warn!(column = %wanted, table = %config.table, "exposed column not in table, skipping");
                }
                found.cloned()
            })
            .collect()
    };

    if selected.is_empty() {
        return Err(StoreError::Sqlite {
            message: format!(
                "none of the exposed columns exist in table '{}'",
                config.table
            ),
        });
    }

    let columns = selected
        .into_iter()
        .map(|c| ColumnDef {
            semantic_type: SemanticType::from_declared(&c.declared_type),
            description: config.column_descriptions.get(&c.name).cloned(),
            name: c.name,
        })
        .collect();
    Ok(SchemaDescriptor::new(config.table.clone(), columns))
}

/// Quote an identifier for direct inclusion in SQL text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, ty: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            declared_type: ty.to_string(),
        }
    }

    #[test]
    fn missing_table_is_table_not_found() {
        let config = StoreConfig::default();
        let err = build_descriptor(&config, Vec::new()).unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound { .. }));
    }

    #[test]
    fn exposed_columns_filter_and_order() {
        let mut config = StoreConfig::default();
        config.exposed_columns = vec!["value".into(), "Country_ISO3".into(), "ghost".into()];
        config
            .column_descriptions
            .insert("value".into(), "Indicator value".into());
        let schema = build_descriptor(
            &config,
            vec![raw("country_iso3", "TEXT"), raw("year", "INTEGER"), raw("value", "REAL")],
        )
        .unwrap();
        assert_eq!(schema.column_names(), vec!["value", "country_iso3"]);
        assert_eq!(
            schema.column("value").and_then(|c| c.description.as_deref()),
            Some("Indicator value")
        );
        assert_eq!(
            schema.column("value").map(|c| c.semantic_type),
            Some(SemanticType::Real)
        );
    }

    #[test]
    fn quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("year"), "\"year\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
