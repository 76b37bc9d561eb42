//! Station counters and kit executions.
//! Counter mutations are single `UPDATE … RETURNING` statements so that
//! concurrent stations (separate connections) are serialized by SQLite.

use crate::db::rows::{fmt_dt, now, parse_dt};
use crate::errors::AppResult;
use crate::models::progress::{JobProgress, KitExecution};
use rusqlite::{Connection, OptionalExtension, params};

/// Atomically bump the open-station counter; returns the post-increment value.
pub fn increment_station_counter(conn: &Connection, job_id: i64) -> AppResult<u32> {
    let n: u32 = conn.query_row(
        "INSERT INTO job_progress (job_id, next_station_number) VALUES (?1, 1)
         ON CONFLICT(job_id) DO UPDATE SET next_station_number = next_station_number + 1
         RETURNING next_station_number",
        [job_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Atomically decrement the counter unless it is already 0.
/// `None` means there was no open station to release.
pub fn decrement_station_counter(conn: &Connection, job_id: i64) -> AppResult<Option<u32>> {
    Ok(conn
        .query_row(
            "UPDATE job_progress SET next_station_number = next_station_number - 1
             WHERE job_id = ?1 AND next_station_number > 0
             RETURNING next_station_number",
            [job_id],
            |row| row.get(0),
        )
        .optional()?)
}

pub fn reset_station_counters(conn: &Connection) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE job_progress SET next_station_number = 0 WHERE next_station_number <> 0",
        [],
    )?)
}

pub fn load_progress(conn: &Connection, job_id: i64) -> AppResult<JobProgress> {
    let row = conn
        .query_row(
            "SELECT next_station_number, completed_kits_total FROM job_progress WHERE job_id = ?1",
            [job_id],
            |row| Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    let (open, total) = row.unwrap_or((0, 0));
    Ok(JobProgress {
        job_id,
        next_station_number: open,
        completed_kits_total: u64::try_from(total).unwrap_or(0),
    })
}

/// Append a kit execution and bump the job total in one transaction.
/// Returns the new authoritative total.
pub fn record_kit(
    conn: &mut Connection,
    job_id: i64,
    station_number: u32,
    station_name: &str,
) -> AppResult<u64> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO kit_executions (job_id, station_number, station_name, completed_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![job_id, station_number, station_name, fmt_dt(&now())],
    )?;
    let total: i64 = tx.query_row(
        "INSERT INTO job_progress (job_id, completed_kits_total) VALUES (?1, 1)
         ON CONFLICT(job_id) DO UPDATE SET completed_kits_total = completed_kits_total + 1
         RETURNING completed_kits_total",
        [job_id],
        |row| row.get(0),
    )?;

    tx.commit()?;
    Ok(u64::try_from(total).unwrap_or(0))
}

pub fn completed_total(conn: &Connection, job_id: i64) -> AppResult<u64> {
    Ok(load_progress(conn, job_id)?.completed_kits_total)
}

pub fn list_kits(conn: &Connection, job_id: i64) -> AppResult<Vec<KitExecution>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, job_id, station_number, station_name, completed_at
         FROM kit_executions WHERE job_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([job_id], |row| {
        let at: String = row.get(4)?;
        Ok(KitExecution {
            id: row.get(0)?,
            job_id: row.get(1)?,
            station_number: row.get(2)?,
            station_name: row.get(3)?,
            completed_at: parse_dt(4, &at)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
