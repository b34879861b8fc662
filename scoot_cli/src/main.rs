use clap::Parser;
use std::path::Path;
use std::time::Duration;

use scoot_core::error::{OdoError, Result};

mod cli;
mod error_fmt;
mod inspect;
mod logging;
mod run;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};

fn load_config(path: &Path) -> Result<scoot_config::Config> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eyre::Report::new(OdoError::Config(format!(
            "read {}: {e}",
            path.display()
        )))
    })?;
    let cfg = scoot_config::load_toml(&text).map_err(|e| {
        eyre::Report::new(OdoError::Config(format!(
            "parse {}: {e}",
            path.display()
        )))
    })?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(OdoError::Config(format!("{e}"))))?;
    Ok(cfg)
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    logging::init(cli.json, cli.log_level.as_deref(), &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run { duration_ms, every } => run::run(
            &cfg,
            cli.json,
            duration_ms.map(Duration::from_millis),
            every,
        ),
        Commands::Replay { log } => run::replay(&cfg, &log, cli.json),
        Commands::Cache => inspect::show_cache(&cfg, cli.json),
        Commands::SelfCheck => inspect::self_check(&cfg, cli.json),
    }
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let json = cli.json;
    let _ = JSON_MODE.set(json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}
