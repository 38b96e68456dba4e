//! Chaosbot - randomized, time-bounded fault injection for distributed test
//! networks.
//!
//! A [`ChaosBot`] periodically picks one of its configured experiments at
//! random and lets it damage a [`Network`]: kill a node, isolate it, make it
//! flicker, slow down or throttle its links, or split the network into
//! partitions. Every fault comes with the steps that undo it, and the bot
//! keeps executing those steps after the run ends until the network is whole
//! again.
//!
//! # Features
//!
//! - **Deterministic replays**: a seeded [`ChaosRng`] and a [`VirtualClock`]
//!   reproduce a run call for call.
//! - **Exclusive faults**: a node carries at most one latency and one
//!   bandwidth fault at a time.
//! - **Bounded partitions**: partition splits stop at a configured maximum.
//! - **Guaranteed cleanup**: pending reversal steps always drain.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ChaosBot: spawn loop | step queue | run history         │
//! ├──────────────────────────────────────────────────────────┤
//! │  Experiments: failure | isolation | latency | partition  │
//! ├──────────────────────────────────────────────────────────┤
//! │  Network trait: Simulated | Recording | your harness     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use chaosbot::{ChaosBot, ChaosBotConfiguration, SimulatedNetwork, VirtualClock};
//! use std::time::Duration;
//!
//! fn main() -> chaosbot::Result<()> {
//!     let config = ChaosBotConfiguration::default().with_seed(Some(42));
//!     let mut bot = ChaosBot::new(SimulatedNetwork::new(5), VirtualClock::new(), config);
//!
//!     bot.run_chaos(Duration::from_secs(600))?;
//!     assert!(bot.network().is_pristine());
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod cli;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod experiment;
pub mod network;
pub mod observability;
pub mod random;
pub mod step;
pub mod types;

// Re-exports
pub use bot::{BotState, ChaosBot, ChaosEvent, RunStats};
pub use clock::{Clock, Timestamp, VirtualClock, WallClock};
pub use config::ChaosBotConfiguration;
pub use context::ChaosContext;
pub use error::{ChaosError, Result};
pub use experiment::Experiment;
pub use network::{Network, NetworkCall, RecordingNetwork, SimulatedNetwork};
pub use random::ChaosRng;
pub use step::{Step, StepAction};
pub use types::*;
