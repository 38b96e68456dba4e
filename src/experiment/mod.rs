//! Fault-injection experiments.
//!
//! An [`Experiment`] picks a target, applies its fault to the network
//! immediately and hands back the [`Step`]s that undo (or continue) the fault
//! later. Experiments are immutable: they hold only their tunable bounds, and
//! everything that changes during a run lives in the network or in the
//! per-run [`ChaosContext`].
//!
//! # Variants
//!
//! | Variant | Target | Fault |
//! |---------|--------|-------|
//! | [`NodeFailureExperiment`] | alive node | killed, restarted later |
//! | [`NodeIsolationExperiment`] | connected node | isolated, rejoined later |
//! | [`FlickeringIsolationExperiment`] | connected node | isolated and rejoined repeatedly |
//! | [`HighLatencyNodeExperiment`] | node without latency fault | slow links, restored later |
//! | [`LowBandwidthNodeExperiment`] | node without bandwidth fault | throttled links, restored later |
//! | [`NetworkPartitionExperiment`] | whole network or largest partition | split, merged later |
//!
//! When no target is eligible, `start` returns an empty list without touching
//! the network.

mod bandwidth;
mod isolation;
mod latency;
mod node_failure;
mod partition;

pub use bandwidth::LowBandwidthNodeExperiment;
pub use isolation::{FlickeringIsolationExperiment, NodeIsolationExperiment};
pub use latency::HighLatencyNodeExperiment;
pub use node_failure::NodeFailureExperiment;
pub use partition::NetworkPartitionExperiment;

use crate::clock::Timestamp;
use crate::context::ChaosContext;
use crate::error::{ChaosError, Result};
use crate::network::Network;
use crate::random::ChaosRng;
use crate::step::Step;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The closed set of fault generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Experiment {
    NodeFailure(NodeFailureExperiment),
    NodeIsolation(NodeIsolationExperiment),
    FlickeringIsolation(FlickeringIsolationExperiment),
    HighLatencyNode(HighLatencyNodeExperiment),
    LowBandwidthNode(LowBandwidthNodeExperiment),
    NetworkPartition(NetworkPartitionExperiment),
}

impl Experiment {
    /// Apply the fault now and return the steps that follow it.
    pub fn start(
        &self,
        network: &mut dyn Network,
        ctx: &mut ChaosContext,
        now: Timestamp,
        rng: &mut ChaosRng,
    ) -> Result<Vec<Step>> {
        match self {
            Experiment::NodeFailure(e) => e.start(network, now, rng),
            Experiment::NodeIsolation(e) => e.start(network, now, rng),
            Experiment::FlickeringIsolation(e) => e.start(network, now, rng),
            Experiment::HighLatencyNode(e) => e.start(network, ctx, now, rng),
            Experiment::LowBandwidthNode(e) => e.start(network, ctx, now, rng),
            Experiment::NetworkPartition(e) => e.start(network, now, rng),
        }
    }

    /// Short name used in logs and run history.
    pub fn name(&self) -> &'static str {
        match self {
            Experiment::NodeFailure(_) => "node-failure",
            Experiment::NodeIsolation(_) => "node-isolation",
            Experiment::FlickeringIsolation(_) => "flickering-isolation",
            Experiment::HighLatencyNode(_) => "high-latency-node",
            Experiment::LowBandwidthNode(_) => "low-bandwidth-node",
            Experiment::NetworkPartition(_) => "network-partition",
        }
    }

    /// Longest time a fault of this experiment stays applied.
    pub fn max_duration(&self) -> Duration {
        match self {
            Experiment::NodeFailure(e) => e.max_duration,
            Experiment::NodeIsolation(e) => e.max_duration,
            Experiment::FlickeringIsolation(e) => e.max_duration,
            Experiment::HighLatencyNode(e) => e.max_duration,
            Experiment::LowBandwidthNode(e) => e.max_duration,
            Experiment::NetworkPartition(e) => e.max_duration,
        }
    }

    /// Check the experiment's bounds.
    pub fn validate(&self) -> Result<()> {
        match self {
            Experiment::NodeFailure(e) => e.validate(),
            Experiment::NodeIsolation(e) => e.validate(),
            Experiment::FlickeringIsolation(e) => e.validate(),
            Experiment::HighLatencyNode(e) => e.validate(),
            Experiment::LowBandwidthNode(e) => e.validate(),
            Experiment::NetworkPartition(e) => e.validate(),
        }
    }

    /// The four heavier experiments a default configuration runs.
    pub fn defaults() -> Vec<Experiment> {
        vec![
            Experiment::HighLatencyNode(HighLatencyNodeExperiment::default()),
            Experiment::LowBandwidthNode(LowBandwidthNodeExperiment::default()),
            Experiment::NetworkPartition(NetworkPartitionExperiment::default()),
            Experiment::NodeFailure(NodeFailureExperiment::default()),
        ]
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<NodeFailureExperiment> for Experiment {
    fn from(e: NodeFailureExperiment) -> Self {
        Experiment::NodeFailure(e)
    }
}

impl From<NodeIsolationExperiment> for Experiment {
    fn from(e: NodeIsolationExperiment) -> Self {
        Experiment::NodeIsolation(e)
    }
}

impl From<FlickeringIsolationExperiment> for Experiment {
    fn from(e: FlickeringIsolationExperiment) -> Self {
        Experiment::FlickeringIsolation(e)
    }
}

impl From<HighLatencyNodeExperiment> for Experiment {
    fn from(e: HighLatencyNodeExperiment) -> Self {
        Experiment::HighLatencyNode(e)
    }
}

impl From<LowBandwidthNodeExperiment> for Experiment {
    fn from(e: LowBandwidthNodeExperiment) -> Self {
        Experiment::LowBandwidthNode(e)
    }
}

impl From<NetworkPartitionExperiment> for Experiment {
    fn from(e: NetworkPartitionExperiment) -> Self {
        Experiment::NetworkPartition(e)
    }
}

/// Pick one candidate uniformly at random.
fn pick<T: Copy>(candidates: &[T], rng: &mut ChaosRng) -> T {
    candidates[rng.next_int(candidates.len())]
}

fn check_bounds<T: PartialOrd + fmt::Debug>(field: &str, min: T, max: T) -> Result<()> {
    if min > max {
        return Err(ChaosError::invalid_config(
            field,
            format!("minimum {:?} exceeds maximum {:?}", min, max),
        ));
    }
    Ok(())
}

fn check_fraction(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ChaosError::invalid_config(
            field,
            format!("{} is outside [0, 1]", value),
        ));
    }
    Ok(())
}
