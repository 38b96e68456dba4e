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
use tracing::info;

/// Kills a random alive node and restarts it after a random duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeFailureExperiment {
    /// Shortest time the node stays down.
    #[serde(with = "humantime_serde")]
    pub min_duration: Duration,
    /// Longest time the node stays down.
    #[serde(with = "humantime_serde")]
    pub max_duration: Duration,
}

impl Default for NodeFailureExperiment {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(10),
            max_duration: Duration::from_secs(60),
        }
    }
}

impl NodeFailureExperiment {
    pub fn new(min_duration: Duration, max_duration: Duration) -> Self {
        Self {
            min_duration,
            max_duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds("node_failure.duration", self.min_duration, self.max_duration)
    }

    pub(super) fn start(
        &self,
        network: &mut dyn Network,
        now: Timestamp,
        rng: &mut ChaosRng,
    ) -> Result<Vec<Step>> {
        let candidates: Vec<NodeId> = network
            .nodes()
            .into_iter()
            .filter(|node| network.is_alive(*node))
            .collect();
        if candidates.is_empty() {
            info!("No alive node left to kill");
            return Ok(Vec::new());
        }

        let node = pick(&candidates, rng);
        let duration = rng.next_duration(self.min_duration, self.max_duration);

        network.kill_immediately(node)?;
        info!(node, ?duration, "Node failure injected");

        Ok(vec![Step::new(now + duration, StepAction::StartNode { node })])
    }
}
