//! SQLite connection wrapper (one connection per process / station).

use crate::errors::AppResult;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    pub fn new(path: &str) -> AppResult<Self> {
        Self::with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Open a connection that waits up to `busy_ms` for a concurrent writer
    /// (other stations) instead of failing with SQLITE_BUSY.
    pub fn with_busy_timeout(path: &str, busy_ms: u64) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        Self::configure(conn, busy_ms)
    }

    pub fn in_memory() -> AppResult<Self> {
        Self::configure(Connection::open_in_memory()?, DEFAULT_BUSY_TIMEOUT_MS)
    }

    fn configure(conn: Connection, busy_ms: u64) -> AppResult<Self> {
        conn.busy_timeout(Duration::from_millis(busy_ms))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }
}
