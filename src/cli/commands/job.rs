use crate::cli::commands::open_pool;
use crate::cli::parser::JobAction;
use crate::config::Config;
use crate::core::jobs::JobLogic;
use crate::db::jobs;
use crate::errors::{AppError, AppResult};
use crate::models::job::{Job, RouteStep};
use crate::ui::messages::{info, success};
use crate::utils::table::Table;
use crate::utils::time::{fmt_datetime, format_seconds, parse_datetime, parse_duration};

/// `"pick=2h"` → step `pick` lasting 7200 s, numbered by its position.
fn parse_step(order: i32, arg: &str) -> AppResult<RouteStep> {
    let (name, duration) = arg
        .split_once('=')
        .ok_or_else(|| AppError::Validation(format!("step '{}' is not NAME=DURATION", arg)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("step '{}' has no name", arg)));
    }
    Ok(RouteStep::new(order, name, parse_duration(duration)?))
}

pub fn handle(action: &JobAction, cfg: &Config) -> AppResult<()> {
    let mut pool = open_pool(cfg)?;

    match action {
        JobAction::Add {
            name,
            start,
            steps,
            shifts,
            weekends,
            stations,
            kits,
        } => {
            let route = steps
                .iter()
                .zip(1..)
                .map(|(s, order)| parse_step(order, s))
                .collect::<AppResult<Vec<_>>>()?;

            let mut job = Job::new(0, name, parse_datetime(start)?)
                .with_steps(route)
                .with_shifts(shifts.clone())
                .with_weekends(*weekends);
            job.station_count = *stations;
            job.kit_quantity = *kits;

            let id = JobLogic::create(&mut pool, &job)?;
            success(format!(
                "Job #{} '{}' created ({} step(s), {} of work).",
                id,
                name,
                job.route_steps.len(),
                format_seconds(job.total_step_seconds())
            ));
        }

        JobAction::List => {
            let all = jobs::load_all_jobs(&pool.conn)?;
            if all.is_empty() {
                info("No jobs defined.");
                return Ok(());
            }

            let mut table = Table::new(&[
                "ID", "Name", "Planned start", "Steps", "Work", "Shifts", "Weekends", "Stations", "Kits",
            ]);
            for j in &all {
                let shifts = if j.allowed_shift_ids.is_empty() {
                    "all active".to_string()
                } else {
                    j.allowed_shift_ids
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                };
                table.add_row(vec![
                    j.id.to_string(),
                    j.name.clone(),
                    fmt_datetime(&j.planned_start),
                    j.route_steps.len().to_string(),
                    format_seconds(j.total_step_seconds()),
                    shifts,
                    if j.include_weekends { "yes" } else { "no" }.to_string(),
                    j.station_count.to_string(),
                    j.kit_quantity.to_string(),
                ]);
            }
            print!("{}", table.render());
        }

        JobAction::Del { id } => {
            JobLogic::delete(&mut pool, *id)?;
            success(format!("Job #{} deleted.", id));
        }
    }

    Ok(())
}
