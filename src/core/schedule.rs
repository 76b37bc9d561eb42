//! Base schedule computer and the schedule read services built on it.

use crate::core::calendar::{ShiftActivity, ShiftCalendar};
use crate::core::delays::apply_delays;
use crate::core::overlay;
use crate::db::pool::DbPool;
use crate::db::{delays, jobs, scenarios, shifts};
use crate::errors::{AppError, AppResult};
use crate::models::delay::JobDelay;
use crate::models::job::Job;
use crate::models::shift::Shift;
use crate::models::timeline::{ExtendedItem, ScheduledItem, Timeline};
use chrono::NaiveDateTime;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedSchedule {
    pub items: Vec<ScheduledItem>,
    pub end: NaiveDateTime,
}

/// Chain the extended items through the calendar: each item starts where
/// the previous one ended. An empty list ends at `job_start`.
pub fn compute_schedule(
    job_start: NaiveDateTime,
    items: &[ExtendedItem],
    calendar: &ShiftCalendar,
) -> ComputedSchedule {
    let mut cursor = job_start;
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let resolution = calendar.resolve(cursor, item.duration_seconds);
        let start = resolution
            .segments
            .first()
            .map(|s| s.start)
            .unwrap_or(cursor);

        out.push(ScheduledItem {
            item: item.clone(),
            start,
            end: resolution.end,
            segments: resolution.segments,
        });
        cursor = resolution.end;
    }

    ComputedSchedule {
        items: out,
        end: cursor,
    }
}

/// Validate, inject delays and compute one job's timeline.
///
/// `scenario_id == None` is the production view, which only ever uses
/// active shifts; callers reach it through [`production_timeline`].
fn build_timeline(
    job: &Job,
    scenario_id: Option<i64>,
    all_shifts: &[Shift],
    all_delays: &[JobDelay],
    activity: ShiftActivity,
) -> AppResult<Timeline> {
    debug_assert!(
        scenario_id.is_some() || activity == ShiftActivity::ActiveOnly,
        "production schedules never ignore shift activity"
    );

    job.validate()?;
    let calendar = ShiftCalendar::new(
        all_shifts,
        &job.allowed_shift_ids,
        job.include_weekends,
        activity,
    )?;

    let job_delays: Vec<JobDelay> = all_delays
        .iter()
        .filter(|d| d.applies_to(job.id, scenario_id))
        .cloned()
        .collect();
    let items = apply_delays(&job.route_steps, &job_delays)?;
    let computed = compute_schedule(job.planned_start, &items, &calendar);

    debug!(
        job_id = job.id,
        scenario_id,
        items = computed.items.len(),
        end = %computed.end,
        "computed timeline"
    );

    Ok(Timeline {
        job_id: job.id,
        job_name: job.name.clone(),
        scenario_id,
        start: job.planned_start,
        end: computed.end,
        items: computed.items,
    })
}

/// Production timeline: active shifts only, production delays only.
pub fn production_timeline(
    job: &Job,
    all_shifts: &[Shift],
    all_delays: &[JobDelay],
) -> AppResult<Timeline> {
    build_timeline(job, None, all_shifts, all_delays, ShiftActivity::ActiveOnly)
}

/// What-if timeline of a job already materialized for `scenario_id`.
/// Production and scenario-scoped delays both apply.
pub fn scenario_timeline(
    job: &Job,
    scenario_id: i64,
    all_shifts: &[Shift],
    all_delays: &[JobDelay],
) -> AppResult<Timeline> {
    build_timeline(
        job,
        Some(scenario_id),
        all_shifts,
        all_delays,
        ShiftActivity::IgnoreActiveStatus,
    )
}

/// Read services over the persisted production state.
pub struct ScheduleLogic;

impl ScheduleLogic {
    /// GetProductionSchedule(jobId)
    pub fn production(pool: &DbPool, job_id: i64) -> AppResult<Timeline> {
        let job = jobs::load_job(&pool.conn, job_id)?;
        let all_shifts = shifts::load_shifts(&pool.conn)?;
        let job_delays = delays::load_delays_for_job(&pool.conn, job_id, None)?;
        production_timeline(&job, &all_shifts, &job_delays)
    }

    /// GetScenarioSchedule(scenarioId, jobId): materialize the scenario
    /// over the current production jobs, then compute the job's timeline.
    pub fn scenario(pool: &DbPool, scenario_id: i64, job_id: i64) -> AppResult<Timeline> {
        let scenario = scenarios::load_scenario(&pool.conn, scenario_id)?;
        let production = jobs::load_all_jobs(&pool.conn)?;
        let materialized = overlay::materialize(&scenario.changes, &production)?;

        let job = materialized
            .iter()
            .find(|j| j.id == job_id)
            .ok_or_else(|| {
                AppError::InvalidReference(format!(
                    "job {} is not part of scenario {}",
                    job_id, scenario_id
                ))
            })?;

        let all_shifts = shifts::load_shifts(&pool.conn)?;
        let all_delays = delays::load_delays(&pool.conn, Some(scenario_id))?;
        scenario_timeline(job, scenario_id, &all_shifts, &all_delays)
    }

    /// Every production job's timeline, ordered by job id.
    pub fn production_all(pool: &DbPool) -> AppResult<Vec<Timeline>> {
        let all_shifts = shifts::load_shifts(&pool.conn)?;
        let all_delays = delays::load_delays(&pool.conn, None)?;
        jobs::load_all_jobs(&pool.conn)?
            .iter()
            .map(|job| production_timeline(job, &all_shifts, &all_delays))
            .collect()
    }

    /// Every job of the scenario's materialized list.
    pub fn scenario_all(pool: &DbPool, scenario_id: i64) -> AppResult<Vec<Timeline>> {
        let scenario = scenarios::load_scenario(&pool.conn, scenario_id)?;
        let production = jobs::load_all_jobs(&pool.conn)?;
        let all_shifts = shifts::load_shifts(&pool.conn)?;
        let all_delays = delays::load_delays(&pool.conn, Some(scenario_id))?;

        overlay::materialize(&scenario.changes, &production)?
            .iter()
            .map(|job| scenario_timeline(job, scenario_id, &all_shifts, &all_delays))
            .collect()
    }
}
