use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::{delays, jobs, scenarios};
use crate::errors::{AppError, AppResult};
use crate::models::job::Job;
use tracing::info;

/// Production job maintenance. Each call is a single transaction so a job
/// is never visible without its route.
pub struct JobLogic;

impl JobLogic {
    pub fn create(pool: &mut DbPool, job: &Job) -> AppResult<i64> {
        let tx = pool.conn.transaction()?;
        let id = jobs::insert_job(&tx, job)?;
        ttlog(
            &tx,
            "job_add",
            &format!("job {}", id),
            &format!("'{}' with {} step(s)", job.name, job.route_steps.len()),
        )?;
        tx.commit()?;

        info!(job_id = id, steps = job.route_steps.len(), "job created");
        Ok(id)
    }

    /// Removes the job with its route, delays and progress.
    ///
    /// Refused while a pending scenario change still names the job; those
    /// scenarios would no longer materialize.
    pub fn delete(pool: &mut DbPool, job_id: i64) -> AppResult<()> {
        let tx = pool.conn.transaction()?;
        let pending = scenarios::scenarios_referencing_job(&tx, job_id)?;
        if !pending.is_empty() {
            let ids: Vec<String> = pending.iter().map(|id| id.to_string()).collect();
            return Err(AppError::Validation(format!(
                "job {} has pending changes in scenario(s) {}; commit or discard them first",
                job_id,
                ids.join(", ")
            )));
        }

        jobs::delete_job(&tx, job_id)?;
        let scoped = delays::delete_scoped_delays_for_job(&tx, job_id)?;
        ttlog(&tx, "job_del", &format!("job {}", job_id), "")?;
        tx.commit()?;

        info!(job_id, scoped_delays = scoped, "job deleted");
        Ok(())
    }
}
