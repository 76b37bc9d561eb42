//! Scenario lifecycle: record changes, commit them to production, discard.

use crate::core::delays::validate_delays;
use crate::core::overlay::{Replay, materialize, required_job_id};
use crate::db::log::{ttlog, ttlog_soft};
use crate::db::pool::DbPool;
use crate::db::rows::now;
use crate::db::{delays, jobs, scenarios};
use crate::errors::{AppError, AppResult};
use crate::models::delay::JobDelay;
use crate::models::job::JobPatch;
use crate::models::scenario::{ChangeOperation, ScenarioChange, is_synthetic_job_id, synthetic_job_id};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

/// Outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub applied_changes: usize,
    /// Synthetic scenario id → persisted job id, for ADDed jobs.
    pub added_jobs: HashMap<i64, i64>,
    pub promoted_delays: usize,
    /// Scoped delays of jobs that no longer exist after the commit.
    pub dropped_delays: usize,
}

pub struct ScenarioLogic;

impl ScenarioLogic {
    pub fn create(pool: &DbPool, name: &str) -> AppResult<i64> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("scenario name is empty".into()));
        }
        let id = scenarios::insert_scenario(&pool.conn, name)?;
        ttlog_soft(&pool.conn, "scenario_create", &format!("scenario {}", id), name);
        Ok(id)
    }

    /// Append a change to the scenario's log.
    ///
    /// The change is replayed against the current working set first, so a
    /// change that could never materialize is rejected here. The resulting
    /// job must also keep an anchor for every production delay and every
    /// delay of this scenario. `original_data` is snapshotted from the
    /// working set for MODIFY and DELETE.
    pub fn record_change(
        pool: &DbPool,
        scenario_id: i64,
        operation: ChangeOperation,
        job_id: Option<i64>,
        change_data: JobPatch,
    ) -> AppResult<ScenarioChange> {
        let scenario = scenarios::load_scenario(&pool.conn, scenario_id)?;
        let production = jobs::load_all_jobs(&pool.conn)?;

        let mut replay = Replay::new(&production);
        for change in &scenario.changes {
            replay.apply(change)?;
        }

        let original_data = match (operation, job_id) {
            (ChangeOperation::Modify, Some(id)) => {
                if change_data.is_empty() {
                    return Err(AppError::Validation("MODIFY change without fields".into()));
                }
                Some(change_data.snapshot_of(replay.job(id)?))
            }
            (ChangeOperation::Delete, Some(id)) => Some(JobPatch::from_job(replay.job(id)?)),
            _ => None,
        };

        // Dry-run on the working set; id 0 stands in for the not yet assigned row id.
        let candidate = ScenarioChange {
            id: 0,
            scenario_id,
            job_id,
            operation,
            change_data: change_data.clone(),
            original_data: original_data.clone(),
            created_at: now(),
        };
        replay.apply(&candidate)?;
        if let Some(target) = candidate.target_job_id()
            && operation != ChangeOperation::Delete
        {
            let job = replay.job(target)?;
            job.validate()?;
            let applicable = delays::load_delays_for_job(&pool.conn, target, Some(scenario_id))?;
            validate_delays(&job.route_steps, &applicable)?;
        }

        let stored = scenarios::insert_change(
            &pool.conn,
            scenario_id,
            job_id,
            operation,
            &change_data,
            original_data.as_ref(),
        )?;

        ttlog_soft(
            &pool.conn,
            "scenario_change",
            &format!("scenario {}", scenario_id),
            &format!(
                "{} job {}",
                operation.to_db_str(),
                stored
                    .target_job_id()
                    .map(|j| j.to_string())
                    .unwrap_or_default()
            ),
        );
        Ok(stored)
    }

    /// UI convenience: one scenario flagged active at a time.
    pub fn activate(pool: &DbPool, scenario_id: i64) -> AppResult<()> {
        scenarios::set_active(&pool.conn, scenario_id)?;
        ttlog_soft(&pool.conn, "scenario_activate", &format!("scenario {}", scenario_id), "");
        Ok(())
    }

    /// CommitScenario(scenarioId).
    ///
    /// The change log is first replayed in memory; ordering errors are
    /// reported as-is and nothing is written. The writes then run in one
    /// transaction: any failure rolls everything back and is reported as
    /// `CommitFailure`, leaving production and the scenario untouched.
    pub fn commit(pool: &mut DbPool, scenario_id: i64) -> AppResult<CommitReport> {
        let scenario = scenarios::load_scenario(&pool.conn, scenario_id)?;
        let production = jobs::load_all_jobs(&pool.conn)?;
        materialize(&scenario.changes, &production)?;

        match apply_changes(&mut pool.conn, scenario_id, &scenario.changes) {
            Ok(report) => {
                info!(
                    scenario_id,
                    changes = report.applied_changes,
                    promoted_delays = report.promoted_delays,
                    "scenario committed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(scenario_id, error = %e, "scenario commit rolled back");
                Err(AppError::CommitFailure {
                    scenario_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// DiscardScenario(scenarioId): drop the scenario with its changes and
    /// scoped delays. Production is not touched.
    pub fn discard(pool: &mut DbPool, scenario_id: i64) -> AppResult<()> {
        let tx = pool.conn.transaction()?;
        scenarios::delete_scenario(&tx, scenario_id)?;
        ttlog(&tx, "scenario_discard", &format!("scenario {}", scenario_id), "")?;
        tx.commit()?;
        info!(scenario_id, "scenario discarded");
        Ok(())
    }
}

fn resolve_job_id(job_id: i64, added: &HashMap<i64, i64>) -> AppResult<i64> {
    if is_synthetic_job_id(job_id) {
        added.get(&job_id).copied().ok_or_else(|| {
            AppError::InvalidReference(format!("scenario job {} was never added", job_id))
        })
    } else {
        Ok(job_id)
    }
}

/// Production delays of a job must still anchor on its (possibly new) route.
fn check_production_delays(conn: &Connection, job_id: i64) -> AppResult<()> {
    let job = jobs::load_job(conn, job_id)?;
    let job_delays = delays::load_delays_for_job(conn, job_id, None)?;
    validate_delays(&job.route_steps, &job_delays)
}

fn apply_changes(
    conn: &mut Connection,
    scenario_id: i64,
    changes: &[ScenarioChange],
) -> AppResult<CommitReport> {
    let tx = conn.transaction()?;
    let mut report = CommitReport::default();
    let mut touched = BTreeSet::new();

    // 1️⃣ Replay the change log against the persisted production set
    for change in changes {
        match change.operation {
            ChangeOperation::Add => {
                let job = change.change_data.to_new_job(0)?;
                let new_id = jobs::insert_job(&tx, &job)?;
                report.added_jobs.insert(synthetic_job_id(change.id), new_id);
                touched.insert(new_id);
            }
            ChangeOperation::Modify => {
                let id = resolve_job_id(required_job_id(change)?, &report.added_jobs)?;
                let mut job = jobs::load_job(&tx, id)?;
                change.change_data.apply_to(&mut job);
                jobs::update_job(&tx, &job)?;
                touched.insert(id);
            }
            ChangeOperation::Delete => {
                let id = resolve_job_id(required_job_id(change)?, &report.added_jobs)?;
                jobs::delete_job(&tx, id)?;
            }
        }
        report.applied_changes += 1;
    }

    // 2️⃣ Promote scoped delays of surviving jobs to production delays
    for d in delays::load_scenario_delays(&tx, scenario_id)? {
        let target = match resolve_job_id(d.job_id, &report.added_jobs) {
            Ok(id) if jobs::job_exists(&tx, id)? => id,
            _ => {
                report.dropped_delays += 1;
                continue;
            }
        };
        delays::insert_delay(
            &tx,
            &JobDelay {
                scenario_id: None,
                job_id: target,
                ..d
            },
        )?;
        touched.insert(target);
        report.promoted_delays += 1;
    }

    // 3️⃣ Only the final routes have to anchor their delays
    for id in touched {
        if jobs::job_exists(&tx, id)? {
            check_production_delays(&tx, id)?;
        }
    }

    // 4️⃣ Clear the scenario
    delays::delete_scenario_delays(&tx, scenario_id)?;
    scenarios::mark_committed(&tx, scenario_id)?;
    ttlog(
        &tx,
        "scenario_commit",
        &format!("scenario {}", scenario_id),
        &format!(
            "{} change(s), {} job(s) added, {} delay(s) promoted",
            report.applied_changes,
            report.added_jobs.len(),
            report.promoted_delays
        ),
    )?;

    tx.commit()?;
    Ok(report)
}
