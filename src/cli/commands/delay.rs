use crate::cli::commands::open_pool;
use crate::cli::parser::DelayAction;
use crate::config::Config;
use crate::core::delays::DelayLogic;
use crate::db::delays;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::table::Table;
use crate::utils::time::{format_seconds, parse_duration};

pub fn handle(action: &DelayAction, cfg: &Config) -> AppResult<()> {
    let pool = open_pool(cfg)?;

    match action {
        DelayAction::Add {
            job,
            name,
            duration,
            after,
            scenario,
        } => {
            let secs = parse_duration(duration)?;
            let delay = DelayLogic::add(&pool, *scenario, *job, name, secs, *after)?;

            let scope = match scenario {
                Some(sid) => format!(" in scenario #{}", sid),
                None => String::new(),
            };
            success(format!(
                "Delay #{} '{}' ({}) added to job {} after step {}{}.",
                delay.id,
                name,
                format_seconds(secs),
                job,
                after,
                scope
            ));
        }

        DelayAction::List { job, scenario } => {
            let rows = delays::load_delays_for_job(&pool.conn, *job, *scenario)?;
            if rows.is_empty() {
                info(format!("No delays for job {}.", job));
                return Ok(());
            }

            let mut table = Table::new(&["ID", "Name", "Duration", "After step", "Scope", "Created"]);
            for d in &rows {
                table.add_row(vec![
                    d.id.to_string(),
                    d.name.clone(),
                    format_seconds(d.duration_seconds),
                    d.insert_after.to_string(),
                    if d.is_production() {
                        "production".to_string()
                    } else {
                        format!("scenario {}", d.scenario_id.unwrap_or_default())
                    },
                    d.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ]);
            }
            print!("{}", table.render());
        }
    }

    Ok(())
}
