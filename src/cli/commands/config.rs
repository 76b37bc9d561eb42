use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::info;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config { print_config } = cmd {
        if *print_config {
            println!("# {}", Config::config_file().display());
            print!("{}", cfg.to_yaml()?);
        } else {
            info("Use --print to show the active configuration.");
        }
    }
    Ok(())
}
