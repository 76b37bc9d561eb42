pub mod config;
pub mod delay;
pub mod init;
pub mod job;
pub mod log;
pub mod scenario;
pub mod schedule;
pub mod shift;
pub mod station;

use crate::config::Config;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

/// Open the configured database with the configured busy timeout.
pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    DbPool::with_busy_timeout(&cfg.database, cfg.busy_timeout_ms)
}
