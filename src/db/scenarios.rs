use crate::db::rows::{fmt_dt, json_col, now_str, parse_dt};
use crate::errors::{AppError, AppResult};
use crate::models::job::JobPatch;
use crate::models::scenario::{ChangeOperation, Scenario, ScenarioChange};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_change(row: &Row) -> rusqlite::Result<ScenarioChange> {
    let op_str: String = row.get("operation")?;
    let operation = ChangeOperation::from_db_str(&op_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            Box::new(AppError::InvalidReference(format!("Invalid operation: {}", op_str))),
        )
    })?;

    let change_data: String = row.get("change_data")?;
    let original_data: Option<String> = row.get("original_data")?;
    let created: String = row.get("created_at")?;

    Ok(ScenarioChange {
        id: row.get("id")?,
        scenario_id: row.get("scenario_id")?,
        job_id: row.get("job_id")?,
        operation,
        change_data: json_col(4, &change_data)?,
        original_data: original_data
            .as_deref()
            .map(|s| json_col::<JobPatch>(5, s))
            .transpose()?,
        created_at: parse_dt(6, &created)?,
    })
}

fn map_scenario(row: &Row) -> rusqlite::Result<Scenario> {
    let committed: Option<String> = row.get("committed_at")?;
    Ok(Scenario {
        id: row.get("id")?,
        name: row.get("name")?,
        is_active: row.get::<_, i32>("is_active")? == 1,
        committed_at: committed.as_deref().map(|s| parse_dt(3, s)).transpose()?,
        changes: Vec::new(),
    })
}

pub fn insert_scenario(conn: &Connection, name: &str) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO scenarios (name, is_active, created_at) VALUES (?1, 0, ?2)",
        params![name, now_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Changes of a scenario in insertion order.
pub fn load_changes(conn: &Connection, scenario_id: i64) -> AppResult<Vec<ScenarioChange>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM scenario_changes WHERE scenario_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([scenario_id], map_change)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn load_scenario(conn: &Connection, id: i64) -> AppResult<Scenario> {
    let scenario = conn
        .query_row("SELECT * FROM scenarios WHERE id = ?1", [id], map_scenario)
        .optional()?;

    let mut scenario = scenario
        .ok_or_else(|| AppError::InvalidReference(format!("scenario {} does not exist", id)))?;
    scenario.changes = load_changes(conn, id)?;
    Ok(scenario)
}

pub fn list_scenarios(conn: &Connection) -> AppResult<Vec<Scenario>> {
    let ids: Vec<i64> = {
        let mut stmt = conn.prepare_cached("SELECT id FROM scenarios ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut v = Vec::new();
        for r in rows {
            v.push(r?);
        }
        v
    };

    ids.into_iter().map(|id| load_scenario(conn, id)).collect()
}

pub fn insert_change(
    conn: &Connection,
    scenario_id: i64,
    job_id: Option<i64>,
    operation: ChangeOperation,
    change_data: &JobPatch,
    original_data: Option<&JobPatch>,
) -> AppResult<ScenarioChange> {
    let created_at = now_str();
    conn.execute(
        "INSERT INTO scenario_changes (scenario_id, job_id, operation, change_data, original_data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            scenario_id,
            job_id,
            operation.to_db_str(),
            serde_json::to_string(change_data)?,
            original_data.map(serde_json::to_string).transpose()?,
            created_at,
        ],
    )?;

    let id = conn.last_insert_rowid();
    Ok(conn.query_row("SELECT * FROM scenario_changes WHERE id = ?1", [id], map_change)?)
}

/// Scenarios whose pending change log names `job_id`.
pub fn scenarios_referencing_job(conn: &Connection, job_id: i64) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT scenario_id FROM scenario_changes WHERE job_id = ?1 ORDER BY scenario_id",
    )?;
    let rows = stmt.query_map([job_id], |row| row.get(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Clear the change log of a committed scenario and stamp it.
pub fn mark_committed(conn: &Connection, scenario_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM scenario_changes WHERE scenario_id = ?1", [scenario_id])?;
    conn.execute(
        "UPDATE scenarios SET committed_at = ?1, is_active = 0 WHERE id = ?2",
        params![now_str(), scenario_id],
    )?;
    Ok(())
}

pub fn delete_scenario(conn: &Connection, scenario_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM scenario_changes WHERE scenario_id = ?1", [scenario_id])?;
    conn.execute("DELETE FROM job_delays WHERE scenario_id = ?1", [scenario_id])?;
    let n = conn.execute("DELETE FROM scenarios WHERE id = ?1", [scenario_id])?;
    if n == 0 {
        return Err(AppError::InvalidReference(format!(
            "scenario {} does not exist",
            scenario_id
        )));
    }
    Ok(())
}

/// Mark one scenario active for display and clear the flag on all others.
pub fn set_active(conn: &Connection, scenario_id: i64) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE scenarios SET is_active = 0", [])?;
    let n = tx.execute("UPDATE scenarios SET is_active = 1 WHERE id = ?1", [scenario_id])?;
    if n == 0 {
        return Err(AppError::InvalidReference(format!(
            "scenario {} does not exist",
            scenario_id
        )));
    }
    tx.commit()?;
    Ok(())
}

pub fn active_scenario_id(conn: &Connection) -> AppResult<Option<i64>> {
    Ok(conn
        .query_row("SELECT id FROM scenarios WHERE is_active = 1 LIMIT 1", [], |row| row.get(0))
        .optional()?)
}

pub fn committed_at_str(scenario: &Scenario) -> String {
    scenario
        .committed_at
        .as_ref()
        .map(fmt_dt)
        .unwrap_or_else(|| "-".to_string())
}
