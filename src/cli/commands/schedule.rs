use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::schedule::ScheduleLogic;
use crate::db::scenarios;
use crate::errors::{AppError, AppResult};
use crate::models::timeline::Timeline;
use crate::ui::messages::info;
use crate::ui::render::timeline_table;

fn print_timelines(timelines: &[Timeline], segments: bool, json: bool) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(timelines)?);
        return Ok(());
    }
    if timelines.is_empty() {
        info("No jobs to schedule.");
    }
    for t in timelines {
        println!("{}", timeline_table(t, segments));
    }
    Ok(())
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Schedule {
        job,
        scenario,
        all,
        segments,
        json,
    } = cmd
    {
        let pool = open_pool(cfg)?;

        let timelines = match (job, scenario, all) {
            (_, None, true) => ScheduleLogic::production_all(&pool)?,
            (_, Some(sid), true) => ScheduleLogic::scenario_all(&pool, *sid)?,
            (Some(id), None, false) => vec![ScheduleLogic::production(&pool, *id)?],
            (Some(id), Some(sid), false) => vec![ScheduleLogic::scenario(&pool, *sid, *id)?],
            (None, _, false) => {
                return Err(AppError::Validation(
                    "give a job id or use --all".to_string(),
                ));
            }
        };

        if scenario.is_none()
            && !json
            && let Some(active) = scenarios::active_scenario_id(&pool.conn)?
        {
            info(format!(
                "Showing production; scenario #{} is active (use --scenario {}).",
                active, active
            ));
        }

        print_timelines(&timelines, *segments, *json)?;
    }

    Ok(())
}
