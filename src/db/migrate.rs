//! Versioned schema migrations.
//! Every migration runs inside its own transaction together with the row
//! that records it in `schema_migrations`.

use crate::db::log::ttlog;
use crate::db::rows::now_str;
use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, params};
use tracing::info;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "base_schema",
        sql: r#"
        CREATE TABLE IF NOT EXISTS shifts (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            name          TEXT NOT NULL,
            start_time    TEXT NOT NULL,
            end_time      TEXT NOT NULL,
            break_start   TEXT,
            break_minutes INTEGER NOT NULL DEFAULT 0 CHECK(break_minutes >= 0),
            is_active     INTEGER NOT NULL DEFAULT 1,
            sort_order    INTEGER NOT NULL DEFAULT 0,
            color         TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            name              TEXT NOT NULL,
            planned_start     TEXT NOT NULL,
            allowed_shift_ids TEXT NOT NULL DEFAULT '[]',
            include_weekends  INTEGER NOT NULL DEFAULT 0,
            station_count     INTEGER NOT NULL DEFAULT 1 CHECK(station_count >= 1),
            kit_quantity      INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS route_steps (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id                INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            step_order            INTEGER NOT NULL,
            name                  TEXT NOT NULL,
            base_duration_seconds INTEGER NOT NULL CHECK(base_duration_seconds >= 0),
            UNIQUE(job_id, step_order)
        );

        CREATE TABLE IF NOT EXISTS scenarios (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT NOT NULL,
            is_active    INTEGER NOT NULL DEFAULT 0,
            committed_at TEXT,
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scenario_changes (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            scenario_id   INTEGER NOT NULL REFERENCES scenarios(id) ON DELETE CASCADE,
            job_id        INTEGER,
            operation     TEXT NOT NULL CHECK(operation IN ('ADD','MODIFY','DELETE')),
            change_data   TEXT NOT NULL DEFAULT '{}',
            original_data TEXT,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS job_delays (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            scenario_id      INTEGER REFERENCES scenarios(id) ON DELETE CASCADE,
            job_id           INTEGER NOT NULL,
            name             TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL CHECK(duration_seconds >= 0),
            insert_after     INTEGER NOT NULL DEFAULT 0 CHECK(insert_after >= 0),
            created_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_route_steps_job ON route_steps(job_id, step_order);
        CREATE INDEX IF NOT EXISTS idx_changes_scenario ON scenario_changes(scenario_id, id);
        CREATE INDEX IF NOT EXISTS idx_delays_job ON job_delays(job_id, scenario_id);
        "#,
    },
    Migration {
        version: 2,
        name: "station_progress",
        sql: r#"
        CREATE TABLE IF NOT EXISTS job_progress (
            job_id               INTEGER PRIMARY KEY REFERENCES jobs(id) ON DELETE CASCADE,
            next_station_number  INTEGER NOT NULL DEFAULT 0 CHECK(next_station_number >= 0),
            completed_kits_total INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS kit_executions (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id         INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            station_number INTEGER NOT NULL,
            station_name   TEXT NOT NULL DEFAULT '',
            completed_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_kits_job_station ON kit_executions(job_id, station_number);
        "#,
    },
];

/// Tables every later migration relies on.
fn ensure_bookkeeping_tables(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

pub fn current_version(conn: &Connection) -> AppResult<i64> {
    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(v.unwrap_or(0))
}

/// Apply every migration newer than the recorded schema version.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_bookkeeping_tables(conn)?;
    let applied = current_version(conn)?;

    for m in MIGRATIONS.iter().filter(|m| m.version > applied) {
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(m.sql)
            .map_err(|e| AppError::Migration(format!("{} (v{}): {}", m.name, m.version, e)))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![m.version, m.name, now_str()],
        )?;
        ttlog(
            &tx,
            "migration_applied",
            m.name,
            &format!("Schema upgraded to version {}", m.version),
        )?;

        tx.commit()?;
        info!(version = m.version, name = m.name, "applied migration");
    }

    Ok(())
}
