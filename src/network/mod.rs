//! The network the chaos bot mutates.
//!
//! [`Network`] is the only mutable resource an experiment touches. A
//! production harness implements it over real processes or containers; this
//! crate ships an in-memory [`SimulatedNetwork`] and a [`RecordingNetwork`]
//! wrapper that logs every call with the current virtual time.
//!
//! Nodes are plain [`NodeId`]s. Lifecycle operations (`is_alive`,
//! `kill_immediately`, `start_node`) are routed through the network, so the
//! engine never has to hold a live handle to a node.

mod recording;
mod simulated;

pub use recording::{NetworkCall, RecordingNetwork};
pub use simulated::SimulatedNetwork;

use crate::error::Result;
use crate::types::{BandwidthLimit, LatencyRange, NodeId, Partition, PartitionId};

/// Mutation and query API of a test network.
pub trait Network {
    /// All nodes, in a stable order.
    fn nodes(&self) -> Vec<NodeId>;

    /// Whether the node's process is running.
    fn is_alive(&self, node: NodeId) -> bool;

    /// Kill the node's process without a graceful shutdown.
    fn kill_immediately(&mut self, node: NodeId) -> Result<()>;

    /// Start a previously killed node.
    fn start_node(&mut self, node: NodeId) -> Result<()>;

    /// Whether the node sits alone in a partition.
    fn is_isolated(&self, node: NodeId) -> bool;

    /// Disconnect the node from every other node.
    fn isolate(&mut self, node: NodeId) -> Result<PartitionId>;

    /// Restore the connections that were cut when the node was isolated.
    fn rejoin(&mut self, node: NodeId) -> Result<()>;

    fn set_latency_for_all_connections(&mut self, node: NodeId, range: LatencyRange) -> Result<()>;

    fn restore_latency_for_all_connections(&mut self, node: NodeId) -> Result<()>;

    fn set_bandwidth_for_all_connections(&mut self, node: NodeId, limit: BandwidthLimit) -> Result<()>;

    fn restore_bandwidth_limits_for_all_connections(&mut self, node: NodeId) -> Result<()>;

    /// Currently active partitions, ordered by id.
    fn network_partitions(&self) -> Vec<Partition>;

    /// Create a partition holding `nodes`. Members stay connected to each
    /// other and lose every connection that leaves the partition.
    fn create_network_partition(&mut self, nodes: &[NodeId]) -> Result<PartitionId>;

    /// Remove a partition created earlier and restore its connectivity.
    fn remove_network_partition(&mut self, partition: PartitionId) -> Result<()>;
}
