use crate::db::rows::{fmt_dt, parse_dt};
use crate::errors::{AppError, AppResult};
use crate::models::delay::JobDelay;
use rusqlite::{Connection, Row, params};

fn map_delay(row: &Row) -> rusqlite::Result<JobDelay> {
    let created: String = row.get("created_at")?;
    Ok(JobDelay {
        id: row.get("id")?,
        scenario_id: row.get("scenario_id")?,
        job_id: row.get("job_id")?,
        name: row.get("name")?,
        duration_seconds: row.get("duration_seconds")?,
        insert_after: row.get("insert_after")?,
        created_at: parse_dt(6, &created)?,
    })
}

fn collect(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> AppResult<Vec<JobDelay>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, map_delay)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_delay(conn: &Connection, delay: &JobDelay) -> AppResult<i64> {
    if delay.duration_seconds < 0 || delay.insert_after < 0 {
        return Err(AppError::Validation(format!(
            "delay '{}' needs a non-negative duration and insertion point",
            delay.name
        )));
    }

    conn.execute(
        "INSERT INTO job_delays (scenario_id, job_id, name, duration_seconds, insert_after, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            delay.scenario_id,
            delay.job_id,
            delay.name,
            delay.duration_seconds,
            delay.insert_after,
            fmt_dt(&delay.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Production delays, plus the scenario's own delays when `scenario_id` is set.
pub fn load_delays(conn: &Connection, scenario_id: Option<i64>) -> AppResult<Vec<JobDelay>> {
    collect(
        conn,
        "SELECT * FROM job_delays
         WHERE scenario_id IS NULL OR scenario_id = ?1
         ORDER BY created_at ASC, id ASC",
        params![scenario_id],
    )
}

pub fn load_delays_for_job(
    conn: &Connection,
    job_id: i64,
    scenario_id: Option<i64>,
) -> AppResult<Vec<JobDelay>> {
    collect(
        conn,
        "SELECT * FROM job_delays
         WHERE job_id = ?1 AND (scenario_id IS NULL OR scenario_id = ?2)
         ORDER BY created_at ASC, id ASC",
        params![job_id, scenario_id],
    )
}

pub fn load_scenario_delays(conn: &Connection, scenario_id: i64) -> AppResult<Vec<JobDelay>> {
    collect(
        conn,
        "SELECT * FROM job_delays WHERE scenario_id = ?1 ORDER BY created_at ASC, id ASC",
        [scenario_id],
    )
}

pub fn delete_scenario_delays(conn: &Connection, scenario_id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM job_delays WHERE scenario_id = ?1", [scenario_id])?)
}

/// Scenario-scoped delays of one job, across every scenario.
pub fn delete_scoped_delays_for_job(conn: &Connection, job_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM job_delays WHERE job_id = ?1 AND scenario_id IS NOT NULL",
        [job_id],
    )?)
}
