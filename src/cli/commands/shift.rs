use crate::cli::commands::open_pool;
use crate::cli::parser::ShiftAction;
use crate::config::Config;
use crate::db::log::ttlog_soft;
use crate::db::shifts;
use crate::errors::{AppError, AppResult};
use crate::models::shift::Shift;
use crate::ui::messages::{info, success};
use crate::utils::colors::{RESET, color_for_active};
use crate::utils::table::Table;
use crate::utils::time::{format_seconds, parse_time};

pub fn handle(action: &ShiftAction, cfg: &Config) -> AppResult<()> {
    let pool = open_pool(cfg)?;

    match action {
        ShiftAction::Add {
            name,
            start,
            end,
            break_start,
            break_minutes,
            order,
            color,
            inactive,
        } => {
            let mut shift = Shift::new(0, name, parse_time(start)?, parse_time(end)?)
                .with_order(*order);
            shift.color = color.clone();
            if let Some(b) = break_start {
                shift = shift.with_break(parse_time(b)?, *break_minutes);
            } else if *break_minutes != 0 {
                return Err(AppError::Validation(
                    "--break requires --break-start".to_string(),
                ));
            }
            if *inactive {
                shift = shift.inactive();
            }

            let id = shifts::insert_shift(&pool.conn, &shift)?;
            ttlog_soft(
                &pool.conn,
                "shift_add",
                &format!("shift {}", id),
                &format!("{} {}-{}", name, start, end),
            );
            success(format!("Shift #{} '{}' created.", id, name));
        }

        ShiftAction::List => {
            let all = shifts::load_shifts(&pool.conn)?;
            if all.is_empty() {
                info("No shifts defined.");
                return Ok(());
            }

            let mut table = Table::new(&["ID", "Name", "Start", "End", "Break", "Capacity", "Order", "Active"]);
            for s in &all {
                let brk = match s.break_start {
                    Some(b) if s.break_minutes > 0 => {
                        format!("{} +{}m", b.format("%H:%M"), s.break_minutes)
                    }
                    _ => "-".to_string(),
                };
                table.add_row(vec![
                    s.id.to_string(),
                    s.name.clone(),
                    s.start.format("%H:%M").to_string(),
                    if s.is_overnight() {
                        format!("{} +1d", s.end.format("%H:%M"))
                    } else {
                        s.end.format("%H:%M").to_string()
                    },
                    brk,
                    format_seconds(s.capacity_seconds()),
                    s.order.to_string(),
                    format!(
                        "{}{}{}",
                        color_for_active(s.is_active),
                        if s.is_active { "yes" } else { "no" },
                        RESET
                    ),
                ]);
            }
            print!("{}", table.render());
        }

        ShiftAction::Toggle { id, on, off } => {
            let active = match (on, off) {
                (true, false) => true,
                (false, true) => false,
                _ => {
                    return Err(AppError::Validation(
                        "use exactly one of --on / --off".to_string(),
                    ));
                }
            };
            shifts::set_shift_active(&pool.conn, *id, active)?;
            ttlog_soft(
                &pool.conn,
                "shift_toggle",
                &format!("shift {}", id),
                if active { "activated" } else { "deactivated" },
            );
            success(format!(
                "Shift #{} {}.",
                id,
                if active { "activated" } else { "deactivated" }
            ));
        }
    }

    Ok(())
}
