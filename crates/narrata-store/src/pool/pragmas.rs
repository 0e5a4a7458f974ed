//! PRAGMA configuration applied to every read connection.
//!
//! busy_timeout from config, query_only ON, 16MB page cache.

use std::time::Duration;

use rusqlite::Connection;

/// Apply read-side pragmas. `query_only` makes SQLite itself refuse any write
/// that slips past the accept-list.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(u64::from(busy_timeout_ms)))?;
    conn.execute_batch(
        "
        PRAGMA query_only = ON;
        PRAGMA cache_size = -16000;
        ",
    )
}

/// Whether `query_only` is active on a connection.
pub fn verify_query_only(conn: &Connection) -> rusqlite::Result<bool> {
    let flag: i64 = conn.pragma_query_value(None, "query_only", |row| row.get(0))?;
    Ok(flag == 1)
}
