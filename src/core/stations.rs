//! Station assignment coordinator.
//!
//! Each job keeps a counter of currently open stations. `assign` is a single
//! read-modify-write step returning the post-increment value as the new
//! station's number; `release` decrements unconditionally (the number being
//! released is only logged) and refuses to go below zero.
//!
//! Because release is not keyed to a specific number, two stations may end
//! up holding the same number after interleaved assign/release sequences.
//! Stations abandoned without a release are recovered with `reset_all`.

use crate::db::log::ttlog_soft;
use crate::db::{jobs, progress};
use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Per-job open-station counter. Calls on the same job are linearizable.
pub trait StationCounter {
    /// Open a station and return its 1-based number.
    fn assign(&self, job_id: i64) -> AppResult<u32>;

    /// Close a station; returns the number of stations still open.
    fn release(&self, job_id: i64, station_number: u32) -> AppResult<u32>;

    /// Force every counter back to 0; returns how many counters changed.
    fn reset_all(&self) -> AppResult<usize>;

    fn open_stations(&self, job_id: i64) -> AppResult<u32>;
}

/// Counters persisted in `job_progress`, shared by every station that
/// opens the same database file.
pub struct SqliteStations<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStations<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn ensure_job(&self, job_id: i64) -> AppResult<()> {
        if jobs::job_exists(self.conn, job_id)? {
            Ok(())
        } else {
            Err(AppError::InvalidReference(format!("job {} does not exist", job_id)))
        }
    }
}

impl StationCounter for SqliteStations<'_> {
    fn assign(&self, job_id: i64) -> AppResult<u32> {
        self.ensure_job(job_id)?;
        let number = progress::increment_station_counter(self.conn, job_id)?;

        debug!(job_id, station = number, "station assigned");
        ttlog_soft(
            self.conn,
            "station_assign",
            &format!("job {}", job_id),
            &format!("station {}", number),
        );
        Ok(number)
    }

    fn release(&self, job_id: i64, station_number: u32) -> AppResult<u32> {
        self.ensure_job(job_id)?;
        let open = progress::decrement_station_counter(self.conn, job_id)?
            .ok_or(AppError::CounterUnderflow { job_id })?;

        debug!(job_id, station = station_number, open, "station released");
        ttlog_soft(
            self.conn,
            "station_release",
            &format!("job {}", job_id),
            &format!("station {} closed, {} still open", station_number, open),
        );
        Ok(open)
    }

    fn reset_all(&self) -> AppResult<usize> {
        let changed = progress::reset_station_counters(self.conn)?;
        info!(changed, "all station counters reset");
        ttlog_soft(
            self.conn,
            "station_reset",
            "all jobs",
            &format!("{} counter(s) reset", changed),
        );
        Ok(changed)
    }

    fn open_stations(&self, job_id: i64) -> AppResult<u32> {
        Ok(progress::load_progress(self.conn, job_id)?.next_station_number)
    }
}

/// Process-local counters guarded by one mutex.
#[derive(Debug, Default)]
pub struct InMemoryStations {
    counters: Mutex<HashMap<i64, u32>>,
}

impl InMemoryStations {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StationCounter for InMemoryStations {
    fn assign(&self, job_id: i64) -> AppResult<u32> {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = counters.entry(job_id).or_insert(0);
        *slot += 1;
        Ok(*slot)
    }

    fn release(&self, job_id: i64, _station_number: u32) -> AppResult<u32> {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        match counters.get_mut(&job_id) {
            Some(slot) if *slot > 0 => {
                *slot -= 1;
                Ok(*slot)
            }
            _ => Err(AppError::CounterUnderflow { job_id }),
        }
    }

    fn reset_all(&self) -> AppResult<usize> {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = 0;
        for slot in counters.values_mut().filter(|v| **v != 0) {
            *slot = 0;
            changed += 1;
        }
        Ok(changed)
    }

    fn open_stations(&self, job_id: i64) -> AppResult<u32> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(counters.get(&job_id).copied().unwrap_or(0))
    }
}
