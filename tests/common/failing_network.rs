// Network double that rejects selected operations

use chaosbot::{
    BandwidthLimit, ChaosError, LatencyRange, Network, NodeId, Partition, PartitionId, Result,
};
use std::collections::HashSet;

/// Mutating operations of the network API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Kill,
    Start,
    Isolate,
    Rejoin,
    SetLatency,
    RestoreLatency,
    SetBandwidth,
    RestoreBandwidth,
    CreatePartition,
    RemovePartition,
}

/// Wraps a network and fails every call of the configured operations
/// without touching the wrapped network.
pub struct FailingNetwork<N> {
    inner: N,
    failing: HashSet<Operation>,
    failures: usize,
}

impl<N: Network> FailingNetwork<N> {
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
            failures: 0,
        }
    }

    pub fn failing(mut self, operation: Operation) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Number of calls rejected so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    fn check(&mut self, operation: Operation) -> Result<()> {
        if self.failing.contains(&operation) {
            self.failures += 1;
            return Err(ChaosError::Network(format!("{:?} rejected", operation)));
        }
        Ok(())
    }
}

impl<N: Network> Network for FailingNetwork<N> {
    fn nodes(&self) -> Vec<NodeId> {
        self.inner.nodes()
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.inner.is_alive(node)
    }

    fn kill_immediately(&mut self, node: NodeId) -> Result<()> {
        self.check(Operation::Kill)?;
        self.inner.kill_immediately(node)
    }

    fn start_node(&mut self, node: NodeId) -> Result<()> {
        self.check(Operation::Start)?;
        self.inner.start_node(node)
    }

    fn is_isolated(&self, node: NodeId) -> bool {
        self.inner.is_isolated(node)
    }

    fn isolate(&mut self, node: NodeId) -> Result<PartitionId> {
        self.check(Operation::Isolate)?;
        self.inner.isolate(node)
    }

    fn rejoin(&mut self, node: NodeId) -> Result<()> {
        self.check(Operation::Rejoin)?;
        self.inner.rejoin(node)
    }

    fn set_latency_for_all_connections(&mut self, node: NodeId, range: LatencyRange) -> Result<()> {
        self.check(Operation::SetLatency)?;
        self.inner.set_latency_for_all_connections(node, range)
    }

    fn restore_latency_for_all_connections(&mut self, node: NodeId) -> Result<()> {
        self.check(Operation::RestoreLatency)?;
        self.inner.restore_latency_for_all_connections(node)
    }

    fn set_bandwidth_for_all_connections(&mut self, node: NodeId, limit: BandwidthLimit) -> Result<()> {
        self.check(Operation::SetBandwidth)?;
        self.inner.set_bandwidth_for_all_connections(node, limit)
    }

    fn restore_bandwidth_limits_for_all_connections(&mut self, node: NodeId) -> Result<()> {
        self.check(Operation::RestoreBandwidth)?;
        self.inner.restore_bandwidth_limits_for_all_connections(node)
    }

    fn network_partitions(&self) -> Vec<Partition> {
        self.inner.network_partitions()
    }

    fn create_network_partition(&mut self, nodes: &[NodeId]) -> Result<PartitionId> {
        self.check(Operation::CreatePartition)?;
        self.inner.create_network_partition(nodes)
    }

    fn remove_network_partition(&mut self, partition: PartitionId) -> Result<()> {
        self.check(Operation::RemovePartition)?;
        self.inner.remove_network_partition(partition)
    }
}
