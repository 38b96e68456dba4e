use super::{check_bounds, check_fraction};
use crate::clock::Timestamp;
use crate::config::humantime_serde;
use crate::error::{ChaosError, Result};
use crate::network::Network;
use crate::random::ChaosRng;
use crate::step::{Step, StepAction};
use crate::types::{NodeId, Partition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;

/// Splits a random subset of nodes off into a new partition.
///
/// The first split divides the whole network into two partitions; later
/// splits carve nodes out of the largest existing partition. No split happens
/// once it would push the partition count past `max_partitions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkPartitionExperiment {
    #[serde(with = "humantime_serde")]
    pub min_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub max_duration: Duration,
    pub max_partitions: usize,
    /// Smallest share of the split partition moved into the new one.
    pub min_partition_fraction: f64,
    /// Largest share of the split partition moved into the new one.
    pub max_partition_fraction: f64,
}

impl Default for NetworkPartitionExperiment {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(30),
            max_duration: Duration::from_secs(120),
            max_partitions: 3,
            min_partition_fraction: 0.1,
            max_partition_fraction: 0.5,
        }
    }
}

impl NetworkPartitionExperiment {
    pub fn new(min_duration: Duration, max_duration: Duration) -> Self {
        Self {
            min_duration,
            max_duration,
            ..Self::default()
        }
    }

    pub fn with_max_partitions(mut self, max_partitions: usize) -> Self {
        self.max_partitions = max_partitions;
        self
    }

    pub fn with_partition_fraction(mut self, min: f64, max: f64) -> Self {
        self.min_partition_fraction = min;
        self.max_partition_fraction = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds("network_partition.duration", self.min_duration, self.max_duration)?;
        check_fraction("network_partition.min_partition_fraction", self.min_partition_fraction)?;
        check_fraction("network_partition.max_partition_fraction", self.max_partition_fraction)?;
        check_bounds(
            "network_partition.partition_fraction",
            self.min_partition_fraction,
            self.max_partition_fraction,
        )?;
        if self.max_partitions < 2 {
            return Err(ChaosError::invalid_config(
                "network_partition.max_partitions",
                "a split always yields at least two partitions",
            ));
        }
        Ok(())
    }

    pub(super) fn start(
        &self,
        network: &mut dyn Network,
        now: Timestamp,
        rng: &mut ChaosRng,
    ) -> Result<Vec<Step>> {
        let partitions = network.network_partitions();
        let created = if partitions.is_empty() { 2 } else { 1 };
        if partitions.len() + created > self.max_partitions {
            info!(
                partitions = partitions.len(),
                max = self.max_partitions,
                "Partition limit reached"
            );
            return Ok(Vec::new());
        }

        let candidates = split_candidates(network, &partitions);
        if candidates.len() < 2 {
            info!(candidates = candidates.len(), "Not enough nodes to split");
            return Ok(Vec::new());
        }

        let members = self.choose_members(&candidates, rng);
        let duration = rng.next_duration(self.min_duration, self.max_duration);

        let partition = network.create_network_partition(&members)?;
        info!(%partition, nodes = ?members, ?duration, "Network partition injected");

        Ok(vec![Step::new(
            now + duration,
            StepAction::RemovePartition { partition },
        )])
    }

    /// Draw a random subset of `candidates`, never all of them.
    fn choose_members(&self, candidates: &[NodeId], rng: &mut ChaosRng) -> Vec<NodeId> {
        let n = candidates.len();
        let fraction = rng.next_f64_in(self.min_partition_fraction, self.max_partition_fraction);
        let requested = ((n as f64 * fraction).ceil() as usize).clamp(1, n - 1);

        // Sampling with replacement, so duplicates can shrink the subset.
        let chosen: BTreeSet<NodeId> = rng
            .ints(requested, 0, n)
            .into_iter()
            .map(|i| candidates[i])
            .collect();
        if chosen.len() < requested {
            info!(requested, chosen = chosen.len(), "Duplicate draws shrank the partition");
        }
        chosen.into_iter().collect()
    }
}

/// The whole network when unpartitioned, otherwise the largest partition
/// (lowest id on ties).
fn split_candidates(network: &dyn Network, partitions: &[Partition]) -> Vec<NodeId> {
    if partitions.is_empty() {
        return network.nodes();
    }
    partitions
        .iter()
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| b.id.cmp(&a.id)))
        .map(|p| p.nodes.iter().copied().collect())
        .unwrap_or_default()
}
