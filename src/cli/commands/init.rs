use crate::cli::commands::open_pool;
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::log::ttlog_soft;
use crate::errors::AppResult;
use crate::ui::messages::success;
use std::fs;
use std::path::Path;

/// Handle the `init` command
///
/// This initializes:
///  - the configuration file (skipped in test mode)
///  - the SQLite database with every pending migration
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if !cli.test {
        let path = Config::config_file();
        cfg.save_to(&path)?;
        println!("📄 Config file : {}", path.display());
    }

    if let Some(dir) = Path::new(&cfg.database).parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    println!("🗄️  Database   : {}", cfg.database);

    let pool = open_pool(cfg)?;
    let version = init_db(&pool.conn)?;

    ttlog_soft(
        &pool.conn,
        "init",
        "database",
        &format!("Database initialized at {} (schema v{})", cfg.database, version),
    );

    success(format!(
        "Database initialized at {} (schema v{})",
        cfg.database, version
    ));
    Ok(())
}
