use super::{check_bounds, check_fraction, pick};
use crate::clock::Timestamp;
use crate::config::humantime_serde;
use crate::context::ChaosContext;
use crate::error::Result;
use crate::network::Network;
use crate::random::ChaosRng;
use crate::step::{Step, StepAction};
use crate::types::{LatencyRange, NodeId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Slows down every link of a random node.
///
/// A node carries at most one latency fault at a time; it becomes eligible
/// again once the restore step has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighLatencyNodeExperiment {
    #[serde(with = "humantime_serde")]
    pub min_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub max_duration: Duration,
    /// Lower bound of the base latency drawn per fault.
    #[serde(with = "humantime_serde")]
    pub min_latency: Duration,
    /// Upper bound of the base latency drawn per fault.
    #[serde(with = "humantime_serde")]
    pub max_latency: Duration,
    /// Relative spread applied around the drawn latency, in `[0, 1]`.
    pub jitter: f64,
}

impl Default for HighLatencyNodeExperiment {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(30),
            max_duration: Duration::from_secs(120),
            min_latency: Duration::from_millis(100),
            max_latency: Duration::from_secs(1),
            jitter: 0.05,
        }
    }
}

impl HighLatencyNodeExperiment {
    pub fn new(min_duration: Duration, max_duration: Duration) -> Self {
        Self {
            min_duration,
            max_duration,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min;
        self.max_latency = max;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds("high_latency_node.duration", self.min_duration, self.max_duration)?;
        check_bounds("high_latency_node.latency", self.min_latency, self.max_latency)?;
        check_fraction("high_latency_node.jitter", self.jitter)
    }

    pub(super) fn start(
        &self,
        network: &mut dyn Network,
        ctx: &mut ChaosContext,
        now: Timestamp,
        rng: &mut ChaosRng,
    ) -> Result<Vec<Step>> {
        let candidates: Vec<NodeId> = network
            .nodes()
            .into_iter()
            .filter(|node| !ctx.is_latency_affected(*node))
            .collect();
        if candidates.is_empty() {
            info!("Every node already has a latency fault");
            return Ok(Vec::new());
        }

        let node = pick(&candidates, rng);
        let latency = rng.next_duration(self.min_latency, self.max_latency);
        let range = LatencyRange::around(latency, self.jitter);
        let duration = rng.next_duration(self.min_duration, self.max_duration);

        network.set_latency_for_all_connections(node, range)?;
        ctx.mark_latency(node);
        info!(node, latency = %range, ?duration, "High latency injected");

        Ok(vec![Step::new(
            now + duration,
            StepAction::RestoreLatency { node },
        )])
    }
}
