//! L2 SQLite-backed response cache.
//!
//! Persists `fingerprint → completion` rows; survives process restarts.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use narrata_core::errors::CacheError;
use narrata_core::models::{CacheEntry, Fingerprint};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS response_cache (
        fingerprint TEXT PRIMARY KEY,
        model       TEXT NOT NULL,
        task_label  TEXT NOT NULL,
        text        TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );
";

/// L2 persistent cache over a single write connection.
pub struct L2SqliteCache {
    conn: Mutex<Connection>,
}

impl L2SqliteCache {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(storage_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(storage_err)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )
        .map_err(storage_err)?;
        Self::init(conn)
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::init(Connection::open_in_memory().map_err(storage_err)?)
    }

    fn init(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let conn = self.conn.lock().map_err(|e| CacheError::Storage {
            message: format!("cache connection lock poisoned: {e}"),
        })?;
        f(&conn)
    }

    pub fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, CacheError> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT fingerprint, model, task_label, text, created_at
                 FROM response_cache WHERE fingerprint = ?1",
                [fingerprint],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(storage_err)
        })?;

        row.map(|(fp, model, task_label, text, created_at)| {
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| CacheError::Storage {
                    message: format!("bad created_at for {fp}: {e}"),
                })?
                .with_timezone(&Utc);
            Ok(CacheEntry {
                fingerprint: Fingerprint::from_hex(fp),
                text,
                created_at,
                model,
                task_label,
            })
        })
        .transpose()
    }

    /// Insert unless the fingerprint is already present. Returns whether a row was written.
    pub fn insert(&self, entry: &CacheEntry) -> Result<bool, CacheError> {
        let written = self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO response_cache (fingerprint, model, task_label, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.fingerprint.as_str(),
                    entry.model,
                    entry.task_label,
                    entry.text,
                    entry.created_at.to_rfc3339(),
                ],
            )
            .map_err(storage_err)
        })?;
        debug!(fingerprint = entry.fingerprint.short(), written = written > 0, "L2 cache insert");
        Ok(written > 0)
    }

    pub fn delete(&self, fingerprint: &str) -> Result<bool, CacheError> {
        let removed = self.with_conn(|conn| {
            conn.execute("DELETE FROM response_cache WHERE fingerprint = ?1", [fingerprint])
                .map_err(storage_err)
        })?;
        Ok(removed > 0)
    }

    pub fn len(&self) -> Result<u64, CacheError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT count(*) FROM response_cache", [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
                .map_err(storage_err)
        })
    }

    /// Entry count per task label, e.g. `("narration", 12)`.
    pub fn count_by_task(&self) -> Result<Vec<(String, u64)>, CacheError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT task_label, count(*) FROM response_cache
                     GROUP BY task_label ORDER BY task_label",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64)))
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }
}

fn storage_err(e: rusqlite::Error) -> CacheError {
    CacheError::Storage {
        message: e.to_string(),
    }
}
