//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "scoot", version, about = "Scooter odometer")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/scoot.toml")]
    pub config: PathBuf,

    /// Print samples and logs as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track distance and speed from the encoder until Ctrl-C
    Run {
        /// Stop on its own after this many milliseconds
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Print only every Nth sample (idle heartbeats included)
        #[arg(long, value_name = "N", default_value_t = 1)]
        every: u64,
    },
    /// Feed a recorded pulse log (CSV, header `t_s`) through the trajectory
    Replay {
        /// Pulse log CSV
        #[arg(long, value_name = "FILE")]
        log: PathBuf,
    },
    /// Show the persisted distance
    Cache,
    /// Validate config, probe the platform and check the cache file
    SelfCheck,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand_position() {
        let cli = Cli::try_parse_from([
            "scoot",
            "--config",
            "x.toml",
            "--json",
            "run",
            "--duration-ms",
            "100",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        match cli.cmd {
            Commands::Run { duration_ms, every } => {
                assert_eq!(duration_ms, Some(100));
                assert_eq!(every, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn replay_requires_log() {
        assert!(Cli::try_parse_from(["scoot", "replay"]).is_err());
    }
}
