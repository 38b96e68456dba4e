//! Chaosbot CLI - Main entry point.

use anyhow::Context;
use chaosbot::cli::{Cli, Commands};
use chaosbot::config::{ChaosBotConfiguration, ObservabilityConfig};
use chaosbot::{
    observability, ChaosBot, Clock, NetworkCall, RecordingNetwork, RunStats, SimulatedNetwork,
    Timestamp, VirtualClock, WallClock,
};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// What a finished run prints to stdout.
#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    nodes: usize,
    #[serde(with = "chaosbot::config::humantime_serde")]
    duration: Duration,
    finished_at: Timestamp,
    pristine: bool,
    stats: RunStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    calls: Option<Vec<TracedCall>>,
}

#[derive(Serialize)]
struct TracedCall {
    at: Timestamp,
    #[serde(flatten)]
    call: NetworkCall,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    observability::init(&ObservabilityConfig {
        log_level: cli.log_level.clone(),
        json_logs: cli.json_logs,
    })?;

    match cli.command {
        Commands::Run {
            nodes,
            duration,
            seed,
            config,
            wall_clock,
            trace,
        } => {
            let config = match config {
                Some(path) => ChaosBotConfiguration::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ChaosBotConfiguration::default(),
            };
            // Resolve the seed up front so the summary can report it.
            let seed = seed.or(config.seed()).unwrap_or_else(rand::random);
            let config = config.with_seed(Some(seed));

            info!(nodes, ?duration, seed, wall_clock, "Starting chaos run");
            let summary = if wall_clock {
                run(WallClock::new(), nodes, duration, config, trace)?
            } else {
                run(VirtualClock::new(), nodes, duration, config, trace)?
            };

            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !summary.pristine {
                anyhow::bail!("network was left degraded after the run");
            }
        }

        Commands::DefaultConfig => {
            println!("{}", ChaosBotConfiguration::default().to_json_pretty()?);
        }
    }

    Ok(())
}

fn run<C: Clock + Clone>(
    clock: C,
    nodes: usize,
    duration: Duration,
    config: ChaosBotConfiguration,
    trace: bool,
) -> anyhow::Result<RunSummary> {
    let seed = config.seed().unwrap_or_default();
    let network = RecordingNetwork::new(SimulatedNetwork::new(nodes), clock.clone());
    let mut bot = ChaosBot::new(network, clock, config);

    bot.run_chaos(duration).context("chaos run aborted")?;

    let finished_at = bot.clock().now();
    let stats = bot.stats();
    let mut network = bot.into_network();
    let calls = trace.then(|| {
        network
            .take_calls()
            .into_iter()
            .map(|(at, call)| TracedCall { at, call })
            .collect()
    });

    Ok(RunSummary {
        seed,
        nodes,
        duration,
        finished_at,
        pristine: network.inner().is_pristine(),
        stats,
        calls,
    })
}
