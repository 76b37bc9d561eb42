use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_log;
use crate::errors::AppResult;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        let pool = open_pool(cfg)?;

        let mut table = Table::new(&["ID", "Date", "Operation", "Target", "Message"]);
        for row in load_log(&pool.conn)? {
            table.add_row(vec![
                row.id.to_string(),
                row.date,
                row.operation,
                row.target,
                row.message,
            ]);
        }
        print!("{}", table.render());
    }

    Ok(())
}
