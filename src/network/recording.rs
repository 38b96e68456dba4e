//! Network wrapper that records every mutation with its timestamp.

use super::Network;
use crate::clock::{Clock, Timestamp, VirtualClock};
use crate::error::Result;
use crate::types::{BandwidthLimit, LatencyRange, NodeId, Partition, PartitionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A mutation issued against the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum NetworkCall {
    KillImmediately { node: NodeId },
    StartNode { node: NodeId },
    Isolate { node: NodeId },
    Rejoin { node: NodeId },
    SetLatency { node: NodeId, range: LatencyRange },
    RestoreLatency { node: NodeId },
    SetBandwidth { node: NodeId, limit: BandwidthLimit },
    RestoreBandwidth { node: NodeId },
    CreatePartition { nodes: Vec<NodeId> },
    RemovePartition { partition: PartitionId },
}

impl fmt::Display for NetworkCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkCall::KillImmediately { node } => write!(f, "kill_immediately({})", node),
            NetworkCall::StartNode { node } => write!(f, "start_node({})", node),
            NetworkCall::Isolate { node } => write!(f, "isolate({})", node),
            NetworkCall::Rejoin { node } => write!(f, "rejoin({})", node),
            NetworkCall::SetLatency { node, range } => write!(f, "set_latency({}, {})", node, range),
            NetworkCall::RestoreLatency { node } => write!(f, "restore_latency({})", node),
            NetworkCall::SetBandwidth { node, limit } => {
                write!(f, "set_bandwidth({}, {})", node, limit)
            }
            NetworkCall::RestoreBandwidth { node } => write!(f, "restore_bandwidth({})", node),
            NetworkCall::CreatePartition { nodes } => write!(f, "create_partition({:?})", nodes),
            NetworkCall::RemovePartition { partition } => {
                write!(f, "remove_partition({})", partition)
            }
        }
    }
}

/// Records `(timestamp, call)` for every mutation before delegating to the
/// wrapped network. Queries are passed through unrecorded.
#[derive(Debug)]
pub struct RecordingNetwork<N, C = VirtualClock> {
    inner: N,
    clock: C,
    calls: Vec<(Timestamp, NetworkCall)>,
}

impl<N: Network, C: Clock> RecordingNetwork<N, C> {
    /// Wrap `inner`, reading timestamps from `clock`.
    ///
    /// Pass a clone of the engine's [`VirtualClock`] so both observe the same
    /// time.
    pub fn new(inner: N, clock: C) -> Self {
        Self {
            inner,
            clock,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[(Timestamp, NetworkCall)] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<(Timestamp, NetworkCall)> {
        std::mem::take(&mut self.calls)
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    pub fn into_inner(self) -> N {
        self.inner
    }

    fn record(&mut self, call: NetworkCall) {
        let now = self.clock.now();
        self.calls.push((now, call));
    }
}

impl<N: Network, C: Clock> Network for RecordingNetwork<N, C> {
    fn nodes(&self) -> Vec<NodeId> {
        self.inner.nodes()
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.inner.is_alive(node)
    }

    fn kill_immediately(&mut self, node: NodeId) -> Result<()> {
        self.record(NetworkCall::KillImmediately { node });
        self.inner.kill_immediately(node)
    }

    fn start_node(&mut self, node: NodeId) -> Result<()> {
        self.record(NetworkCall::StartNode { node });
        self.inner.start_node(node)
    }

    fn is_isolated(&self, node: NodeId) -> bool {
        self.inner.is_isolated(node)
    }

    fn isolate(&mut self, node: NodeId) -> Result<PartitionId> {
        self.record(NetworkCall::Isolate { node });
        self.inner.isolate(node)
    }

    fn rejoin(&mut self, node: NodeId) -> Result<()> {
        self.record(NetworkCall::Rejoin { node });
        self.inner.rejoin(node)
    }

    fn set_latency_for_all_connections(&mut self, node: NodeId, range: LatencyRange) -> Result<()> {
        self.record(NetworkCall::SetLatency { node, range });
        self.inner.set_latency_for_all_connections(node, range)
    }

    fn restore_latency_for_all_connections(&mut self, node: NodeId) -> Result<()> {
        self.record(NetworkCall::RestoreLatency { node });
        self.inner.restore_latency_for_all_connections(node)
    }

    fn set_bandwidth_for_all_connections(&mut self, node: NodeId, limit: BandwidthLimit) -> Result<()> {
        self.record(NetworkCall::SetBandwidth { node, limit });
        self.inner.set_bandwidth_for_all_connections(node, limit)
    }

    fn restore_bandwidth_limits_for_all_connections(&mut self, node: NodeId) -> Result<()> {
        self.record(NetworkCall::RestoreBandwidth { node });
        self.inner.restore_bandwidth_limits_for_all_connections(node)
    }

    fn network_partitions(&self) -> Vec<Partition> {
        self.inner.network_partitions()
    }

    fn create_network_partition(&mut self, nodes: &[NodeId]) -> Result<PartitionId> {
        self.record(NetworkCall::CreatePartition {
            nodes: nodes.to_vec(),
        });
        self.inner.create_network_partition(nodes)
    }

    fn remove_network_partition(&mut self, partition: PartitionId) -> Result<()> {
        self.record(NetworkCall::RemovePartition { partition });
        self.inner.remove_network_partition(partition)
    }
}
