use crate::db::migrate::{current_version, run_pending_migrations};
use crate::errors::AppResult;
use rusqlite::Connection;
use tracing::debug;

/// Bring the schema up to date and return its version.
/// Tables are only ever created by migrations.
pub fn init_db(conn: &Connection) -> AppResult<i64> {
    run_pending_migrations(conn)?;

    let version = current_version(conn)?;
    debug!(version, "schema ready");
    Ok(version)
}
