use crate::cli::commands::open_pool;
use crate::cli::parser::ScenarioAction;
use crate::config::Config;
use crate::core::scenario::ScenarioLogic;
use crate::db::scenarios;
use crate::errors::AppResult;
use crate::models::job::JobPatch;
use crate::models::scenario::{ChangeOperation, ScenarioChange};
use crate::ui::messages::{info, success};
use crate::utils::colors::{BOLD, GREEN, GREY, RESET};
use crate::utils::table::Table;

fn parse_patch(data: &str) -> AppResult<JobPatch> {
    Ok(serde_json::from_str(data)?)
}

fn patch_json(patch: Option<&JobPatch>) -> AppResult<String> {
    match patch {
        Some(p) => Ok(serde_json::to_string(p)?),
        None => Ok("-".to_string()),
    }
}

fn changes_table(changes: &[ScenarioChange]) -> AppResult<String> {
    let mut table = Table::new(&["Change", "Op", "Job", "New values", "Was"]);
    for c in changes {
        table.add_row(vec![
            c.id.to_string(),
            c.operation.to_db_str().to_string(),
            c.target_job_id().map(|j| j.to_string()).unwrap_or_default(),
            patch_json(Some(&c.change_data))?,
            format!("{}{}{}", GREY, patch_json(c.original_data.as_ref())?, RESET),
        ]);
    }
    Ok(table.render())
}

fn report_change(change: &ScenarioChange) {
    let target = change
        .target_job_id()
        .map(|j| format!(" on job {}", j))
        .unwrap_or_default();
    success(format!(
        "Change #{} {}{} recorded in scenario #{}.",
        change.id,
        change.operation.to_db_str(),
        target,
        change.scenario_id
    ));
}

pub fn handle(action: &ScenarioAction, cfg: &Config) -> AppResult<()> {
    let mut pool = open_pool(cfg)?;

    match action {
        ScenarioAction::Create { name } => {
            let id = ScenarioLogic::create(&pool, name)?;
            success(format!("Scenario #{} '{}' created.", id, name));
        }

        ScenarioAction::List => {
            let all = scenarios::list_scenarios(&pool.conn)?;
            if all.is_empty() {
                info("No scenarios.");
                return Ok(());
            }

            for s in &all {
                let marker = if s.is_active {
                    format!(" {}[active]{}", GREEN, RESET)
                } else {
                    String::new()
                };
                println!(
                    "{}Scenario #{} '{}'{}{}  committed: {}",
                    BOLD,
                    s.id,
                    s.name,
                    RESET,
                    marker,
                    scenarios::committed_at_str(s)
                );
                if s.changes.is_empty() {
                    println!("  (no pending changes)\n");
                } else {
                    println!("{}", changes_table(&s.changes)?);
                }
            }
        }

        ScenarioAction::Add { scenario, data } => {
            let change = ScenarioLogic::record_change(
                &pool,
                *scenario,
                ChangeOperation::Add,
                None,
                parse_patch(data)?,
            )?;
            report_change(&change);
        }

        ScenarioAction::Modify {
            scenario,
            job,
            data,
        } => {
            let change = ScenarioLogic::record_change(
                &pool,
                *scenario,
                ChangeOperation::Modify,
                Some(*job),
                parse_patch(data)?,
            )?;
            report_change(&change);
        }

        ScenarioAction::Delete { scenario, job } => {
            let change = ScenarioLogic::record_change(
                &pool,
                *scenario,
                ChangeOperation::Delete,
                Some(*job),
                JobPatch::default(),
            )?;
            report_change(&change);
        }

        ScenarioAction::Activate { id } => {
            ScenarioLogic::activate(&pool, *id)?;
            success(format!("Scenario #{} is now active.", id));
        }

        ScenarioAction::Commit { id } => {
            let report = ScenarioLogic::commit(&mut pool, *id)?;
            success(format!(
                "Scenario #{} committed: {} change(s) applied, {} delay(s) promoted.",
                id, report.applied_changes, report.promoted_delays
            ));

            let mut added: Vec<_> = report.added_jobs.iter().collect();
            added.sort();
            for (synthetic, real) in added {
                info(format!("Scenario job {} is now job #{}.", synthetic, real));
            }
            if report.dropped_delays > 0 {
                info(format!(
                    "{} delay(s) of deleted jobs were dropped.",
                    report.dropped_delays
                ));
            }
        }

        ScenarioAction::Discard { id } => {
            ScenarioLogic::discard(&mut pool, *id)?;
            success(format!("Scenario #{} discarded.", id));
        }
    }

    Ok(())
}
