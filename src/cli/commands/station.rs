use crate::cli::commands::open_pool;
use crate::cli::parser::StationAction;
use crate::config::Config;
use crate::core::progress::{KitTracker, record_kit, spawn_db_poller};
use crate::core::stations::{SqliteStations, StationCounter};
use crate::db::{jobs, progress};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{RESET, color_for_drift};
use crate::utils::table::Table;
use std::sync::mpsc;
use std::time::Duration;

pub fn handle(action: &StationAction, cfg: &Config) -> AppResult<()> {
    let mut pool = open_pool(cfg)?;

    match action {
        StationAction::Assign { job } => {
            let number = SqliteStations::new(&pool.conn).assign(*job)?;
            success(format!("Station {} opened on job {}.", number, job));
        }

        StationAction::Release { job, station } => {
            let open = SqliteStations::new(&pool.conn).release(*job, *station)?;
            success(format!(
                "Station {} closed on job {} ({} still open).",
                station, job, open
            ));
        }

        StationAction::Reset => {
            let changed = SqliteStations::new(&pool.conn).reset_all()?;
            if changed == 0 {
                info("No open stations to reset.");
            } else {
                warning(format!("{} job counter(s) forced back to 0.", changed));
            }
        }

        StationAction::Kit { job, station, name } => {
            let total = record_kit(&mut pool, *job, *station, name)?;
            success(format!(
                "Kit recorded on job {} by station {} (total {}).",
                job, station, total
            ));
        }

        StationAction::Status { job } => {
            let j = jobs::load_job(&pool.conn, *job)?;
            let p = progress::load_progress(&pool.conn, *job)?;
            println!(
                "Job #{} '{}': {} open station(s), {} / {} kit(s) completed",
                j.id, j.name, p.next_station_number, p.completed_kits_total, j.kit_quantity
            );

            let kits = progress::list_kits(&pool.conn, *job)?;
            if !kits.is_empty() {
                let mut table = Table::new(&["Kit", "Station", "Name", "Completed"]);
                for k in &kits {
                    table.add_row(vec![
                        k.id.to_string(),
                        k.station_number.to_string(),
                        k.station_name.clone(),
                        k.completed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ]);
                }
                print!("{}", table.render());
            }
        }

        StationAction::Watch {
            job,
            polls,
            interval,
        } => {
            if !jobs::job_exists(&pool.conn, *job)? {
                return Err(AppError::InvalidReference(format!("job {} does not exist", job)));
            }
            let initial = progress::completed_total(&pool.conn, *job)?;
            let mut tracker = KitTracker::new(*job, 0, initial);

            let every = Duration::from_secs(interval.unwrap_or(cfg.poll_interval_secs).max(1));
            let (tx, rx) = mpsc::channel::<u64>();
            let poller = spawn_db_poller(&cfg.database, cfg.busy_timeout_ms, *job, every, move |total| {
                // The receiver is gone once the watch loop ends.
                let _ = tx.send(total);
            })?;

            info(format!(
                "Watching job {} every {}s (Ctrl-C to stop).",
                job,
                every.as_secs()
            ));

            let mut seen = 0u32;
            for total in rx.iter() {
                let drift = tracker.reconcile(total);
                println!(
                    "kits: {} {}({:+}){}",
                    tracker.displayed_total(),
                    color_for_drift(drift),
                    drift,
                    RESET
                );
                seen += 1;
                if polls.is_some_and(|max| seen >= max) {
                    break;
                }
            }

            poller.stop();
        }
    }

    Ok(())
}
