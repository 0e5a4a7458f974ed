//! Test fixtures for narrata: a World Development Indicators sample, a builder
//! for a file-backed SQLite copy of it, and a scripted generative model.

pub mod scripted;
pub mod wdi;

use std::path::PathBuf;

use serde::de::DeserializeOwned;

pub use scripted::{ScriptedModel, ScriptedTask};
pub use wdi::{build_wdi_database, load_wdi_rows, wdi_store_config, WdiRow, GDP_CODE, POPULATION_CODE};

/// Root directory of the fixture data.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}
