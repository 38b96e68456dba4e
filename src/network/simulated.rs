//! In-memory network used by tests, benchmarks and the CLI.

use super::Network;
use crate::error::{ChaosError, Result};
use crate::types::{BandwidthLimit, LatencyRange, NodeId, Partition, PartitionId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct SimulatedNode {
    alive: bool,
    latency: Option<LatencyRange>,
    bandwidth: Option<BandwidthLimit>,
}

impl SimulatedNode {
    fn new() -> Self {
        Self {
            alive: true,
            latency: None,
            bandwidth: None,
        }
    }
}

/// A network that keeps topology, liveness and link shaping in memory.
///
/// Partitioning follows the usual test-harness rules: creating the first
/// partition implicitly puts every other node into a "remaining" partition,
/// a node belongs to at most one partition, and removing one of the last two
/// partitions restores full connectivity.
#[derive(Debug, Clone)]
pub struct SimulatedNetwork {
    nodes: BTreeMap<NodeId, SimulatedNode>,
    partitions: BTreeMap<PartitionId, BTreeSet<NodeId>>,
    membership: BTreeMap<NodeId, PartitionId>,
    remaining: Option<PartitionId>,
    next_partition_id: u64,
}

impl SimulatedNetwork {
    /// A network of `count` healthy nodes with ids `0..count`.
    pub fn new(count: usize) -> Self {
        Self::with_nodes(0..count as NodeId)
    }

    pub fn with_nodes(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            nodes: ids.into_iter().map(|id| (id, SimulatedNode::new())).collect(),
            partitions: BTreeMap::new(),
            membership: BTreeMap::new(),
            remaining: None,
            next_partition_id: 0,
        }
    }

    /// Latency override currently applied to the node.
    pub fn latency_of(&self, node: NodeId) -> Option<LatencyRange> {
        self.nodes.get(&node).and_then(|n| n.latency)
    }

    /// Bandwidth override currently applied to the node.
    pub fn bandwidth_of(&self, node: NodeId) -> Option<BandwidthLimit> {
        self.nodes.get(&node).and_then(|n| n.bandwidth)
    }

    /// Partition the node currently belongs to.
    pub fn partition_of(&self, node: NodeId) -> Option<PartitionId> {
        self.membership.get(&node).copied()
    }

    pub fn alive_count(&self) -> usize {
        self.nodes.values().filter(|n| n.alive).count()
    }

    /// Whether every fault has been undone: all nodes alive, fully connected
    /// and without latency or bandwidth overrides.
    pub fn is_pristine(&self) -> bool {
        self.membership.is_empty()
            && self
                .nodes
                .values()
                .all(|n| n.alive && n.latency.is_none() && n.bandwidth.is_none())
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut SimulatedNode> {
        self.nodes.get_mut(&node).ok_or(ChaosError::NodeNotFound(node))
    }

    fn allocate_partition(&mut self, members: BTreeSet<NodeId>) -> PartitionId {
        let id = PartitionId(self.next_partition_id);
        self.next_partition_id += 1;
        for node in &members {
            if let Some(old) = self.membership.insert(*node, id) {
                if let Some(old_members) = self.partitions.get_mut(&old) {
                    old_members.remove(node);
                }
            }
        }
        self.partitions.insert(id, members);
        id
    }

    fn clear_partitions(&mut self) {
        self.partitions.clear();
        self.membership.clear();
        self.remaining = None;
    }
}

impl Network for SimulatedNetwork {
    fn nodes(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.nodes.get(&node).map(|n| n.alive).unwrap_or(false)
    }

    fn kill_immediately(&mut self, node: NodeId) -> Result<()> {
        let state = self.node_mut(node)?;
        if !state.alive {
            debug!(node, "Node already stopped");
            return Ok(());
        }
        state.alive = false;
        info!(node, "Killed node");
        Ok(())
    }

    fn start_node(&mut self, node: NodeId) -> Result<()> {
        let state = self.node_mut(node)?;
        if state.alive {
            debug!(node, "Node already running");
            return Ok(());
        }
        state.alive = true;
        info!(node, "Started node");
        Ok(())
    }

    fn is_isolated(&self, node: NodeId) -> bool {
        self.membership
            .get(&node)
            .and_then(|id| self.partitions.get(id))
            .map(|members| members.len() == 1)
            .unwrap_or(false)
    }

    fn isolate(&mut self, node: NodeId) -> Result<PartitionId> {
        self.create_network_partition(&[node])
    }

    fn rejoin(&mut self, node: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&node) {
            return Err(ChaosError::NodeNotFound(node));
        }
        match self.membership.get(&node).copied() {
            Some(partition) => self.remove_network_partition(partition),
            None => {
                debug!(node, "Node is not partitioned, nothing to rejoin");
                Ok(())
            }
        }
    }

    fn set_latency_for_all_connections(&mut self, node: NodeId, range: LatencyRange) -> Result<()> {
        self.node_mut(node)?.latency = Some(range);
        info!(node, latency = %range, "Set latency for all connections");
        Ok(())
    }

    fn restore_latency_for_all_connections(&mut self, node: NodeId) -> Result<()> {
        self.node_mut(node)?.latency = None;
        info!(node, "Restored latency for all connections");
        Ok(())
    }

    fn set_bandwidth_for_all_connections(&mut self, node: NodeId, limit: BandwidthLimit) -> Result<()> {
        self.node_mut(node)?.bandwidth = Some(limit);
        info!(node, bandwidth = %limit, "Set bandwidth for all connections");
        Ok(())
    }

    fn restore_bandwidth_limits_for_all_connections(&mut self, node: NodeId) -> Result<()> {
        self.node_mut(node)?.bandwidth = None;
        info!(node, "Restored bandwidth for all connections");
        Ok(())
    }

    fn network_partitions(&self) -> Vec<Partition> {
        self.partitions
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(id, members)| Partition::new(*id, members.iter().copied()))
            .collect()
    }

    fn create_network_partition(&mut self, nodes: &[NodeId]) -> Result<PartitionId> {
        if nodes.is_empty() {
            return Err(ChaosError::InvalidArgument(
                "Cannot create a partition with no nodes".into(),
            ));
        }
        let members: BTreeSet<NodeId> = nodes.iter().copied().collect();
        if let Some(unknown) = members.iter().find(|n| !self.nodes.contains_key(n)) {
            return Err(ChaosError::NodeNotFound(*unknown));
        }
        if members.len() == self.nodes.len() {
            return Err(ChaosError::InvalidArgument(
                "Cannot create a partition with all nodes".into(),
            ));
        }

        let id = self.allocate_partition(members.clone());
        if self.remaining.is_none() {
            let rest: BTreeSet<NodeId> = self
                .nodes
                .keys()
                .filter(|n| !members.contains(n))
                .copied()
                .collect();
            self.remaining = Some(self.allocate_partition(rest));
        }

        info!(partition = %id, size = members.len(), "Created network partition");
        Ok(id)
    }

    fn remove_network_partition(&mut self, partition: PartitionId) -> Result<()> {
        if partition.0 >= self.next_partition_id {
            return Err(ChaosError::PartitionNotFound(partition));
        }

        let active = self.network_partitions();
        if !active.iter().any(|p| p.id == partition) {
            debug!(partition = %partition, "Partition already dissolved");
            if Some(partition) != self.remaining {
                self.partitions.remove(&partition);
            }
            return Ok(());
        }

        if active.len() == 2 {
            self.clear_partitions();
            info!(partition = %partition, "Removed last partition, network fully connected");
            return Ok(());
        }

        let Some(remaining) = self.remaining else {
            return Err(ChaosError::Internal(
                "Partitions exist without a remaining partition".into(),
            ));
        };
        if partition == remaining {
            debug!(partition = %partition, "Remaining partition cannot be removed");
            return Ok(());
        }

        let members = self.partitions.remove(&partition).unwrap_or_default();
        for node in &members {
            self.membership.insert(*node, remaining);
        }
        self.partitions.entry(remaining).or_default().extend(members);

        info!(partition = %partition, "Removed network partition");
        Ok(())
    }
}
