//! Deferred actions produced by experiments.

use crate::clock::Timestamp;
use crate::context::ChaosContext;
use crate::error::Result;
use crate::network::Network;
use crate::types::{NodeId, PartitionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An action the engine performs at a later time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Restart a killed node.
    StartNode { node: NodeId },
    /// Cut the node off again (flickering isolation).
    Isolate { node: NodeId },
    /// Reconnect an isolated node.
    Rejoin { node: NodeId },
    /// Drop the latency override and release the node's latency registration.
    RestoreLatency { node: NodeId },
    /// Drop the bandwidth cap and release the node's bandwidth registration.
    RestoreBandwidth { node: NodeId },
    /// Dissolve a partition.
    RemovePartition { partition: PartitionId },
}

impl StepAction {
    /// Perform the action against the network.
    ///
    /// Registry entries are released only after the network accepted the
    /// reversal.
    pub fn execute(&self, network: &mut dyn Network, ctx: &mut ChaosContext) -> Result<()> {
        match *self {
            StepAction::StartNode { node } => network.start_node(node),
            StepAction::Isolate { node } => network.isolate(node).map(|_| ()),
            StepAction::Rejoin { node } => network.rejoin(node),
            StepAction::RestoreLatency { node } => {
                network.restore_latency_for_all_connections(node)?;
                ctx.clear_latency(node);
                Ok(())
            }
            StepAction::RestoreBandwidth { node } => {
                network.restore_bandwidth_limits_for_all_connections(node)?;
                ctx.clear_bandwidth(node);
                Ok(())
            }
            StepAction::RemovePartition { partition } => network.remove_network_partition(partition),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::StartNode { node } => write!(f, "start_node({})", node),
            StepAction::Isolate { node } => write!(f, "isolate({})", node),
            StepAction::Rejoin { node } => write!(f, "rejoin({})", node),
            StepAction::RestoreLatency { node } => write!(f, "restore_latency({})", node),
            StepAction::RestoreBandwidth { node } => write!(f, "restore_bandwidth({})", node),
            StepAction::RemovePartition { partition } => write!(f, "remove_partition({})", partition),
        }
    }
}

/// A timestamped action, consumed exactly once by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub timestamp: Timestamp,
    pub action: StepAction,
}

impl Step {
    pub fn new(timestamp: Timestamp, action: StepAction) -> Self {
        Self { timestamp, action }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::SimulatedNetwork;
    use crate::types::LatencyRange;
    use std::time::Duration;

    #[test]
    fn test_restore_latency_releases_registry() {
        let mut network = SimulatedNetwork::new(3);
        let mut ctx = ChaosContext::new();
        network
            .set_latency_for_all_connections(1, LatencyRange::around(Duration::from_millis(50), 0.0))
            .unwrap();
        ctx.mark_latency(1);

        StepAction::RestoreLatency { node: 1 }
            .execute(&mut network, &mut ctx)
            .unwrap();

        assert!(!ctx.is_latency_affected(1));
        assert!(network.is_pristine());
    }

    #[test]
    fn test_failed_restore_keeps_registry() {
        let mut network = SimulatedNetwork::new(3);
        let mut ctx = ChaosContext::new();
        ctx.mark_bandwidth(7);

        let result = StepAction::RestoreBandwidth { node: 7 }.execute(&mut network, &mut ctx);

        assert!(result.is_err());
        assert!(ctx.is_bandwidth_affected(7));
    }

    #[test]
    fn test_isolate_and_rejoin_actions() {
        let mut network = SimulatedNetwork::new(3);
        let mut ctx = ChaosContext::new();

        StepAction::Isolate { node: 0 }.execute(&mut network, &mut ctx).unwrap();
        assert!(network.is_isolated(0));
        StepAction::Rejoin { node: 0 }.execute(&mut network, &mut ctx).unwrap();
        assert!(network.is_pristine());
    }

    #[test]
    fn test_display() {
        assert_eq!(StepAction::StartNode { node: 2 }.to_string(), "start_node(2)");
        assert_eq!(
            StepAction::RemovePartition {
                partition: PartitionId(3)
            }
            .to_string(),
            "remove_partition(partition-3)"
        );
    }
}
