use crate::db::rows::{fmt_dt, json_col, now_str, parse_dt};
use crate::errors::{AppError, AppResult};
use crate::models::job::{Job, RouteStep};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_job(row: &Row) -> rusqlite::Result<Job> {
    let start: String = row.get("planned_start")?;
    let shift_ids: String = row.get("allowed_shift_ids")?;

    Ok(Job {
        id: row.get("id")?,
        name: row.get("name")?,
        planned_start: parse_dt(2, &start)?,
        route_steps: Vec::new(),
        allowed_shift_ids: json_col(3, &shift_ids)?,
        include_weekends: row.get::<_, i32>("include_weekends")? == 1,
        station_count: row.get("station_count")?,
        kit_quantity: row.get("kit_quantity")?,
    })
}

fn map_step(row: &Row) -> rusqlite::Result<RouteStep> {
    Ok(RouteStep {
        id: row.get("id")?,
        order: row.get("step_order")?,
        name: row.get("name")?,
        base_duration_seconds: row.get("base_duration_seconds")?,
    })
}

pub fn load_steps(conn: &Connection, job_id: i64) -> AppResult<Vec<RouteStep>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, step_order, name, base_duration_seconds FROM route_steps
         WHERE job_id = ?1
         ORDER BY step_order ASC",
    )?;
    let rows = stmt.query_map([job_id], map_step)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn insert_steps(conn: &Connection, job_id: i64, steps: &[RouteStep]) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO route_steps (job_id, step_order, name, base_duration_seconds)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for s in steps {
        stmt.execute(params![job_id, s.order, s.name, s.base_duration_seconds])?;
    }
    Ok(())
}

pub fn job_exists(conn: &Connection, id: i64) -> AppResult<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM jobs WHERE id = ?1")?;
    Ok(stmt.exists([id])?)
}

pub fn load_job(conn: &Connection, id: i64) -> AppResult<Job> {
    let job = conn
        .query_row("SELECT * FROM jobs WHERE id = ?1", [id], map_job)
        .optional()?;

    let mut job = job.ok_or_else(|| AppError::InvalidReference(format!("job {} does not exist", id)))?;
    job.route_steps = load_steps(conn, id)?;
    Ok(job)
}

/// Production job snapshot, ordered by id.
pub fn load_all_jobs(conn: &Connection) -> AppResult<Vec<Job>> {
    let jobs: Vec<Job> = {
        let mut stmt = conn.prepare_cached("SELECT * FROM jobs ORDER BY id ASC")?;
        let rows = stmt.query_map([], map_job)?;

        let mut v = Vec::new();
        for r in rows {
            v.push(r?);
        }
        v
    };

    let mut out = Vec::with_capacity(jobs.len());
    for mut job in jobs {
        job.route_steps = load_steps(conn, job.id)?;
        out.push(job);
    }
    Ok(out)
}

/// Insert a job and its route. The job's own `id` is ignored.
pub fn insert_job(conn: &Connection, job: &Job) -> AppResult<i64> {
    job.validate()?;

    conn.execute(
        "INSERT INTO jobs (name, planned_start, allowed_shift_ids, include_weekends, station_count, kit_quantity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            job.name,
            fmt_dt(&job.planned_start),
            serde_json::to_string(&job.allowed_shift_ids)?,
            if job.include_weekends { 1 } else { 0 },
            job.station_count,
            job.kit_quantity,
            now_str(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    insert_steps(conn, id, &job.route_steps)?;
    Ok(id)
}

/// Overwrite all fields of an existing job; the route is replaced as a whole.
pub fn update_job(conn: &Connection, job: &Job) -> AppResult<()> {
    job.validate()?;

    let n = conn.execute(
        "UPDATE jobs
         SET name = ?1, planned_start = ?2, allowed_shift_ids = ?3,
             include_weekends = ?4, station_count = ?5, kit_quantity = ?6
         WHERE id = ?7",
        params![
            job.name,
            fmt_dt(&job.planned_start),
            serde_json::to_string(&job.allowed_shift_ids)?,
            if job.include_weekends { 1 } else { 0 },
            job.station_count,
            job.kit_quantity,
            job.id,
        ],
    )?;
    if n == 0 {
        return Err(AppError::InvalidReference(format!("job {} does not exist", job.id)));
    }

    conn.execute("DELETE FROM route_steps WHERE job_id = ?1", [job.id])?;
    insert_steps(conn, job.id, &job.route_steps)?;
    Ok(())
}

/// Delete a job together with everything it owns.
pub fn delete_job(conn: &Connection, id: i64) -> AppResult<()> {
    if !job_exists(conn, id)? {
        return Err(AppError::InvalidReference(format!("job {} does not exist", id)));
    }

    conn.execute(
        "DELETE FROM job_delays WHERE job_id = ?1 AND scenario_id IS NULL",
        [id],
    )?;
    conn.execute("DELETE FROM kit_executions WHERE job_id = ?1", [id])?;
    conn.execute("DELETE FROM job_progress WHERE job_id = ?1", [id])?;
    conn.execute("DELETE FROM route_steps WHERE job_id = ?1", [id])?;
    conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
    Ok(())
}
