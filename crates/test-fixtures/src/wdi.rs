//! WDI sample dataset and its SQLite rendition.

use std::path::Path;

use rusqlite::{params, Connection};
use serde::Deserialize;

use narrata_core::config::StoreConfig;

pub const GDP_CODE: &str = "NY.GDP.MKTP.CD";
pub const POPULATION_CODE: &str = "SP.POP.TOTL";

/// One long-format observation.
#[derive(Debug, Clone, Deserialize)]
pub struct WdiRow {
    pub country: String,
    pub country_iso3: String,
    pub indicator_code: String,
    pub indicator_name: String,
    pub year: i64,
    pub value: Option<f64>,
    pub footnote: Option<String>,
}

/// All rows of `wdi/sample_rows.json`.
pub fn load_wdi_rows() -> Vec<WdiRow> {
    crate::load_fixture("wdi/sample_rows.json")
}

/// Create a SQLite database at `path` with a `wdi` table holding the sample rows.
pub fn build_wdi_database(path: &Path) -> rusqlite::Result<()> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE wdi (
            country        TEXT NOT NULL,
            country_iso3   TEXT NOT NULL,
            indicator_code TEXT NOT NULL,
            indicator_name TEXT NOT NULL,
            year           INTEGER NOT NULL,
            value          REAL,
            footnote       TEXT
        );",
    )?;
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO wdi (country, country_iso3, indicator_code, indicator_name, year, value, footnote)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for row in load_wdi_rows() {
            stmt.execute(params![
                row.country,
                row.country_iso3,
                row.indicator_code,
                row.indicator_name,
                row.year,
                row.value,
                row.footnote,
            ])?;
        }
    }
    tx.commit()
}

/// Store config pointing at a fixture database, with the long-format columns exposed.
pub fn wdi_store_config(db_path: &Path) -> StoreConfig {
    let mut config = StoreConfig {
        db_path: db_path.display().to_string(),
        read_pool_size: 2,
        exposed_columns: vec![
            "country".into(),
            "country_iso3".into(),
            "indicator_code".into(),
            "year".into(),
            "value".into(),
            "footnote".into(),
        ],
        ..Default::default()
    };
    config
        .column_descriptions
        .insert("country_iso3".into(), "ISO 3166-1 alpha-3 country code".into());
    config
        .column_descriptions
        .insert("indicator_code".into(), "World Bank indicator code".into());
    config.indicator_names.insert(GDP_CODE.into(), "GDP (current US$)".into());
    config
        .indicator_names
        .insert(POPULATION_CODE.into(), "Population, total".into());
    config
}
