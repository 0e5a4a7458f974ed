//! Pool of 1 to 8 read-only connections. An idle connection is preferred;
//! a caller blocks only when every connection is busy.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use rusqlite::{Connection, OpenFlags};

use narrata_core::errors::{QueryExecutionError, StoreError};

use super::pragmas::apply_read_pragmas;

/// Maximum number of read connections.
const MAX_POOL_SIZE: usize = 8;

/// A pool of read-only SQLite connections.
pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    /// Open `pool_size` read-only connections to an existing database file.
    pub fn open(path: &Path, pool_size: usize, busy_timeout_ms: u32) -> Result<Self, StoreError> {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| StoreError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            apply_read_pragmas(&conn, busy_timeout_ms).map_err(|e| StoreError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            connections.push(Mutex::new(conn));
        }
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    /// Run a closure on an idle connection, scanning from the round-robin
    /// index. Waits on the starting connection only when all are busy.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, QueryExecutionError>
    where
        F: FnOnce(&Connection) -> Result<T, QueryExecutionError>,
    {
        let guard = self.acquire()?;
        f(&guard)
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Connection>, QueryExecutionError> {
        let len = self.connections.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % len;
        for offset in 0..len {
            match self.connections[(start + offset) % len].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(e)) => return Err(poisoned(e)),
            }
        }
        self.connections[start].lock().map_err(poisoned)
    }

    /// Number of connections in the pool.
    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

fn poisoned(e: impl std::fmt::Display) -> QueryExecutionError {
    QueryExecutionError::ConnectionLost {
        reason: format!("read pool lock poisoned: {e}"),
    }
}
