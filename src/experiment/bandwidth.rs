use super::{check_bounds, pick};
use crate::clock::Timestamp;
use crate::config::humantime_serde;
use crate::context::ChaosContext;
use crate::error::{ChaosError, Result};
use crate::network::Network;
use crate::random::ChaosRng;
use crate::step::{Step, StepAction};
use crate::types::{BandwidthLimit, NodeId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Throttles every link of a random node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowBandwidthNodeExperiment {
    #[serde(with = "humantime_serde")]
    pub min_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub max_duration: Duration,
    pub min_bandwidth_kbps: u64,
    pub max_bandwidth_kbps: u64,
}

impl Default for LowBandwidthNodeExperiment {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(30),
            max_duration: Duration::from_secs(120),
            min_bandwidth_kbps: 10,
            max_bandwidth_kbps: 1000,
        }
    }
}

impl LowBandwidthNodeExperiment {
    pub fn new(min_duration: Duration, max_duration: Duration) -> Self {
        Self {
            min_duration,
            max_duration,
            ..Self::default()
        }
    }

    pub fn with_bandwidth_kbps(mut self, min: u64, max: u64) -> Self {
        self.min_bandwidth_kbps = min;
        self.max_bandwidth_kbps = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds("low_bandwidth_node.duration", self.min_duration, self.max_duration)?;
        check_bounds(
            "low_bandwidth_node.bandwidth_kbps",
            self.min_bandwidth_kbps,
            self.max_bandwidth_kbps,
        )?;
        if self.min_bandwidth_kbps == 0 {
            return Err(ChaosError::invalid_config(
                "low_bandwidth_node.bandwidth_kbps",
                "minimum bandwidth must be positive",
            ));
        }
        Ok(())
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
            .filter(|node| !ctx.is_bandwidth_affected(*node))
            .collect();
        if candidates.is_empty() {
            info!("Every node already has a bandwidth fault");
            return Ok(Vec::new());
        }

        let node = pick(&candidates, rng);
        let limit = BandwidthLimit::of_kilobytes_per_second(
            rng.next_u64_in(self.min_bandwidth_kbps, self.max_bandwidth_kbps),
        );
        let duration = rng.next_duration(self.min_duration, self.max_duration);

        network.set_bandwidth_for_all_connections(node, limit)?;
        ctx.mark_bandwidth(node);
        info!(node, bandwidth = %limit, ?duration, "Low bandwidth injected");

        Ok(vec![Step::new(
            now + duration,
            StepAction::RestoreBandwidth { node },
        )])
    }
}
