//! kitplan library root.
//! Exposes the CLI parser, the high-level run() function and the
//! scheduling, scenario and station modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding `log_filter` from the config file.
pub const LOG_ENV: &str = "KITPLAN_LOG";

/// Diagnostics go to stderr so command output stays parseable.
fn init_tracing(cfg: &Config) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));

    // A subscriber may already be installed when embedded (e.g. tests).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli, cfg),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Shift { action } => cli::commands::shift::handle(action, cfg),
        Commands::Job { action } => cli::commands::job::handle(action, cfg),
        Commands::Delay { action } => cli::commands::delay::handle(action, cfg),
        Commands::Scenario { action } => cli::commands::scenario::handle(action, cfg),
        Commands::Schedule { .. } => cli::commands::schedule::handle(&cli.command, cfg),
        Commands::Station { action } => cli::commands::station::handle(action, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // 2️⃣ load config once
    let mut cfg = Config::load()?;

    // 3️⃣ command-line database override
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    // 4️⃣ logging, then dispatch
    init_tracing(&cfg);
    tracing::debug!(database = %cfg.database, test = cli.test, "starting");

    dispatch(&cli, &cfg)
}
