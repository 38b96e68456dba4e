//! Command-line interface for the chaos bot.

use crate::config::humantime_serde::parse_duration;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Chaosbot - randomized fault injection for distributed test networks.
#[derive(Parser)]
#[command(name = "chaosbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CHAOSBOT_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run chaos against a simulated network and print a summary
    Run {
        /// Number of simulated nodes
        #[arg(short, long, default_value_t = 5)]
        nodes: usize,

        /// Run duration (e.g. 500ms, 30s, 10m, 1h)
        #[arg(short, long, default_value = "10m", value_parser = parse_duration_arg)]
        duration: Duration,

        /// Seed for a reproducible run; overrides the configuration file
        #[arg(short, long)]
        seed: Option<u64>,

        /// Configuration file path
        #[arg(short, long, env = "CHAOSBOT_CONFIG")]
        config: Option<PathBuf>,

        /// Pace the run against real time instead of a virtual clock
        #[arg(long)]
        wall_clock: bool,

        /// Include every network call in the summary
        #[arg(long)]
        trace: bool,
    },

    /// Print the default configuration as JSON
    DefaultConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s)
}
