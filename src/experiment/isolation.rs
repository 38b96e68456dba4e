use super::{check_bounds, pick};
use crate::clock::Timestamp;
use crate::config::humantime_serde;
use crate::error::Result;
use crate::network::Network;
use crate::random::ChaosRng;
use crate::step::{Step, StepAction};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Shortest connected or disconnected phase of a flickering node.
const MIN_FLICKER_PHASE: Duration = Duration::from_millis(1);

fn connected_nodes(network: &dyn Network) -> Vec<NodeId> {
    network
        .nodes()
        .into_iter()
        .filter(|node| !network.is_isolated(*node))
        .collect()
}

/// Isolates a random node and rejoins it after a random duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeIsolationExperiment {
    #[serde(with = "humantime_serde")]
    pub min_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub max_duration: Duration,
}

impl Default for NodeIsolationExperiment {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(10),
            max_duration: Duration::from_secs(60),
        }
    }
}

impl NodeIsolationExperiment {
    pub fn new(min_duration: Duration, max_duration: Duration) -> Self {
        Self {
            min_duration,
            max_duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds("node_isolation.duration", self.min_duration, self.max_duration)
    }

    pub(super) fn start(
        &self,
        network: &mut dyn Network,
        now: Timestamp,
        rng: &mut ChaosRng,
    ) -> Result<Vec<Step>> {
        let candidates = connected_nodes(network);
        if candidates.is_empty() {
            info!("No connected node left to isolate");
            return Ok(Vec::new());
        }

        let node = pick(&candidates, rng);
        let duration = rng.next_duration(self.min_duration, self.max_duration);

        network.isolate(node)?;
        info!(node, ?duration, "Node isolated");

        Ok(vec![Step::new(now + duration, StepAction::Rejoin { node })])
    }
}

/// Isolates a random node, then keeps toggling its connectivity until the
/// experiment ends. The node always ends up rejoined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickeringIsolationExperiment {
    /// Shortest total length of the experiment.
    #[serde(with = "humantime_serde")]
    pub min_duration: Duration,
    /// Longest total length of the experiment.
    #[serde(with = "humantime_serde")]
    pub max_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub min_disconnect_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub max_disconnect_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub min_connected_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub max_connected_duration: Duration,
}

impl Default for FlickeringIsolationExperiment {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(30),
            max_duration: Duration::from_secs(120),
            min_disconnect_duration: Duration::from_secs(1),
            max_disconnect_duration: Duration::from_secs(5),
            min_connected_duration: Duration::from_secs(1),
            max_connected_duration: Duration::from_secs(5),
        }
    }
}

impl FlickeringIsolationExperiment {
    pub fn new(min_duration: Duration, max_duration: Duration) -> Self {
        Self {
            min_duration,
            max_duration,
            ..Self::default()
        }
    }

    pub fn with_disconnect_duration(mut self, min: Duration, max: Duration) -> Self {
        self.min_disconnect_duration = min;
        self.max_disconnect_duration = max;
        self
    }

    pub fn with_connected_duration(mut self, min: Duration, max: Duration) -> Self {
        self.min_connected_duration = min;
        self.max_connected_duration = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds("flickering_isolation.duration", self.min_duration, self.max_duration)?;
        check_bounds(
            "flickering_isolation.disconnect_duration",
            self.min_disconnect_duration,
            self.max_disconnect_duration,
        )?;
        check_bounds(
            "flickering_isolation.connected_duration",
            self.min_connected_duration,
            self.max_connected_duration,
        )
    }

    pub(super) fn start(
        &self,
        network: &mut dyn Network,
        now: Timestamp,
        rng: &mut ChaosRng,
    ) -> Result<Vec<Step>> {
        let candidates = connected_nodes(network);
        if candidates.is_empty() {
            info!("No connected node left to flicker");
            return Ok(Vec::new());
        }

        let node = pick(&candidates, rng);
        let duration = rng.next_duration(self.min_duration, self.max_duration);

        network.isolate(node)?;
        let steps = self.flicker_steps(node, now, now + duration, rng);
        info!(node, ?duration, toggles = steps.len(), "Flickering isolation started");

        Ok(steps)
    }

    /// Alternating rejoin/isolate steps after the initial isolation, ending
    /// with a rejoin no later than `end`.
    fn flicker_steps(
        &self,
        node: NodeId,
        now: Timestamp,
        end: Timestamp,
        rng: &mut ChaosRng,
    ) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut cursor = now;

        loop {
            cursor = cursor + self.phase(self.min_disconnect_duration, self.max_disconnect_duration, rng);
            if cursor >= end {
                steps.push(Step::new(end, StepAction::Rejoin { node }));
                break;
            }
            steps.push(Step::new(cursor, StepAction::Rejoin { node }));

            cursor = cursor + self.phase(self.min_connected_duration, self.max_connected_duration, rng);
            if cursor >= end {
                break;
            }
            steps.push(Step::new(cursor, StepAction::Isolate { node }));
        }

        debug!(node, steps = steps.len(), "Generated flicker schedule");
        steps
    }

    fn phase(&self, min: Duration, max: Duration, rng: &mut ChaosRng) -> Duration {
        rng.next_duration(min, max).max(MIN_FLICKER_PHASE)
    }
}
