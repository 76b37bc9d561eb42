use crate::db::rows::{fmt_hm, parse_hm};
use crate::errors::{AppError, AppResult};
use crate::models::shift::Shift;
use rusqlite::{Connection, Row, params};

fn map_shift(row: &Row) -> rusqlite::Result<Shift> {
    let start: String = row.get("start_time")?;
    let end: String = row.get("end_time")?;
    let break_start: Option<String> = row.get("break_start")?;

    Ok(Shift {
        id: row.get("id")?,
        name: row.get("name")?,
        start: parse_hm(2, &start)?,
        end: parse_hm(3, &end)?,
        break_start: break_start.as_deref().map(|b| parse_hm(4, b)).transpose()?,
        break_minutes: row.get("break_minutes")?,
        is_active: row.get::<_, i32>("is_active")? == 1,
        order: row.get("sort_order")?,
        color: row.get("color")?,
    })
}

pub fn insert_shift(conn: &Connection, shift: &Shift) -> AppResult<i64> {
    if shift.break_minutes < 0 {
        return Err(AppError::Validation(format!(
            "shift '{}' has a negative break",
            shift.name
        )));
    }

    conn.execute(
        "INSERT INTO shifts (name, start_time, end_time, break_start, break_minutes, is_active, sort_order, color)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            shift.name,
            fmt_hm(&shift.start),
            fmt_hm(&shift.end),
            shift.break_start.as_ref().map(fmt_hm),
            shift.break_minutes,
            if shift.is_active { 1 } else { 0 },
            shift.order,
            shift.color,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All shifts ordered by `sort_order` (default shift selection order).
pub fn load_shifts(conn: &Connection) -> AppResult<Vec<Shift>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM shifts ORDER BY sort_order ASC, id ASC")?;
    let rows = stmt.query_map([], map_shift)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn set_shift_active(conn: &Connection, id: i64, active: bool) -> AppResult<()> {
    let n = conn.execute(
        "UPDATE shifts SET is_active = ?1 WHERE id = ?2",
        params![if active { 1 } else { 0 }, id],
    )?;
    if n == 0 {
        return Err(AppError::InvalidReference(format!("shift {} does not exist", id)));
    }
    Ok(())
}
