//! Scenario overlay: replay a scenario's change log over a production
//! snapshot to derive an alternate job list.
//!
//! The replay is copy-on-write. Production jobs are cloned into a private
//! working set and never mutated; materializing the same change log over
//! the same snapshot always yields the same list.
//!
//! Replay rules, applied in change insertion order:
//! - ADD appends a new job with the synthetic id `-(change id)`; it must not
//!   name a `job_id`.
//! - MODIFY overwrites only the fields present in `change_data` on a job of
//!   the working set (production or earlier ADD).
//! - DELETE removes a job from the working set.
//! - Any change targeting a job deleted earlier in the same replay is an
//!   `InvalidOperationSequence`; a target that never existed is an
//!   `InvalidReference`.

use crate::errors::{AppError, AppResult};
use crate::models::job::Job;
use crate::models::scenario::{ChangeOperation, ScenarioChange};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Replay {
    jobs: Vec<Job>,
    deleted: HashSet<i64>,
}

impl Replay {
    pub fn new(production: &[Job]) -> Self {
        Self {
            jobs: production.to_vec(),
            deleted: HashSet::new(),
        }
    }

    fn position(&self, job_id: i64, change_id: i64) -> AppResult<usize> {
        if self.deleted.contains(&job_id) {
            return Err(AppError::InvalidOperationSequence(format!(
                "change {} targets job {} which was deleted earlier in the scenario",
                change_id, job_id
            )));
        }
        self.jobs.iter().position(|j| j.id == job_id).ok_or_else(|| {
            AppError::InvalidReference(format!(
                "change {} targets job {} which does not exist",
                change_id, job_id
            ))
        })
    }

    /// Current state of a job in the working set.
    pub fn job(&self, job_id: i64) -> AppResult<&Job> {
        let idx = self.position(job_id, 0)?;
        Ok(&self.jobs[idx])
    }

    pub fn apply(&mut self, change: &ScenarioChange) -> AppResult<()> {
        match change.operation {
            ChangeOperation::Add => {
                if let Some(job_id) = change.job_id {
                    return Err(AppError::InvalidReference(format!(
                        "ADD change {} must not reference an existing job (got {})",
                        change.id, job_id
                    )));
                }
                let id = change
                    .target_job_id()
                    .ok_or_else(|| AppError::InvalidReference("ADD without target".into()))?;
                if self.deleted.contains(&id) || self.jobs.iter().any(|j| j.id == id) {
                    return Err(AppError::InvalidOperationSequence(format!(
                        "ADD change {} was replayed twice",
                        change.id
                    )));
                }
                let job = change.change_data.to_new_job(id)?;
                self.jobs.push(job);
            }

            ChangeOperation::Modify => {
                let job_id = required_job_id(change)?;
                let idx = self.position(job_id, change.id)?;
                change.change_data.apply_to(&mut self.jobs[idx]);
            }

            ChangeOperation::Delete => {
                let job_id = required_job_id(change)?;
                let idx = self.position(job_id, change.id)?;
                self.jobs.remove(idx);
                self.deleted.insert(job_id);
            }
        }
        Ok(())
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }
}

pub(crate) fn required_job_id(change: &ScenarioChange) -> AppResult<i64> {
    change.job_id.ok_or_else(|| {
        AppError::InvalidReference(format!(
            "{} change {} has no job id",
            change.operation.to_db_str(),
            change.id
        ))
    })
}

/// Replay `changes` in order over `production` and return the alternate list.
pub fn materialize(changes: &[ScenarioChange], production: &[Job]) -> AppResult<Vec<Job>> {
    let mut replay = Replay::new(production);
    for change in changes {
        replay.apply(change)?;
    }
    Ok(replay.into_jobs())
}
