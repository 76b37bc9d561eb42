//! Delay injection: weave named extra durations into a job's step list.
//!
//! The schedule computer downstream is delay-agnostic; it only sees the
//! resulting [`ExtendedItem`] list.

use crate::core::overlay::materialize;
use crate::db::delays as db_delays;
use crate::db::log::ttlog_soft;
use crate::db::pool::DbPool;
use crate::db::rows::now;
use crate::db::{jobs, scenarios};
use crate::errors::{AppError, AppResult};
use crate::models::delay::JobDelay;
use crate::models::job::RouteStep;
use crate::models::timeline::{ExtendedItem, ItemKind};

fn step_item(step: &RouteStep) -> ExtendedItem {
    ExtendedItem {
        kind: ItemKind::Step,
        name: step.name.clone(),
        duration_seconds: step.base_duration_seconds,
        anchor_order: step.order,
    }
}

fn delay_item(delay: &JobDelay) -> ExtendedItem {
    ExtendedItem {
        kind: ItemKind::Delay,
        name: delay.name.clone(),
        duration_seconds: delay.duration_seconds,
        anchor_order: delay.insert_after,
    }
}

/// Every delay must anchor on an existing step order (or 0) and be non-negative.
pub fn validate_delays(steps: &[RouteStep], delays: &[JobDelay]) -> AppResult<()> {
    for d in delays {
        if d.duration_seconds < 0 {
            return Err(AppError::Validation(format!(
                "delay '{}' has a negative duration",
                d.name
            )));
        }
        if d.insert_after != 0 && !steps.iter().any(|s| s.order == d.insert_after) {
            return Err(AppError::InvalidReference(format!(
                "delay '{}' is anchored after step {} which is not in the route of job {}",
                d.name, d.insert_after, d.job_id
            )));
        }
    }
    Ok(())
}

/// Build the extended step list.
///
/// Delays with `insert_after = 0` come first; every other delay follows its
/// anchor step. Delays sharing an anchor keep creation order (`created_at`,
/// then id) and are never merged.
pub fn apply_delays(steps: &[RouteStep], delays: &[JobDelay]) -> AppResult<Vec<ExtendedItem>> {
    validate_delays(steps, delays)?;

    let mut ordered: Vec<&JobDelay> = delays.iter().collect();
    ordered.sort_by_key(|d| (d.created_at, d.id));

    let anchored = |order: i32| ordered.iter().filter(move |d| d.insert_after == order);

    let mut out = Vec::with_capacity(steps.len() + delays.len());
    out.extend(anchored(0).map(|d| delay_item(d)));
    for step in steps {
        out.push(step_item(step));
        out.extend(anchored(step.order).map(|d| delay_item(d)));
    }
    Ok(out)
}

/// Persisted delay management.
pub struct DelayLogic;

impl DelayLogic {
    /// Create a delay for a production job (`scenario_id = None`) or for a
    /// job as it exists inside a scenario (including ADDed jobs).
    pub fn add(
        pool: &DbPool,
        scenario_id: Option<i64>,
        job_id: i64,
        name: &str,
        duration_seconds: i64,
        insert_after: i32,
    ) -> AppResult<JobDelay> {
        let job = match scenario_id {
            None => jobs::load_job(&pool.conn, job_id)?,
            Some(sid) => {
                let scenario = scenarios::load_scenario(&pool.conn, sid)?;
                let production = jobs::load_all_jobs(&pool.conn)?;
                materialize(&scenario.changes, &production)?
                    .into_iter()
                    .find(|j| j.id == job_id)
                    .ok_or_else(|| {
                        AppError::InvalidReference(format!(
                            "job {} is not part of scenario {}",
                            job_id, sid
                        ))
                    })?
            }
        };

        let mut delay = JobDelay {
            id: 0,
            scenario_id,
            job_id,
            name: name.to_string(),
            duration_seconds,
            insert_after,
            created_at: now(),
        };
        validate_delays(&job.route_steps, std::slice::from_ref(&delay))?;

        delay.id = db_delays::insert_delay(&pool.conn, &delay)?;
        ttlog_soft(
            &pool.conn,
            "delay_add",
            &format!("job {}", job_id),
            &format!(
                "'{}' {}s after step {}{}",
                name,
                duration_seconds,
                insert_after,
                scenario_id
                    .map(|s| format!(" (scenario {})", s))
                    .unwrap_or_default()
            ),
        );
        Ok(delay)
    }
}
