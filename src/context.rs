//! Per-run bookkeeping shared by experiments and their reversal steps.

use crate::types::NodeId;
use std::collections::BTreeSet;

/// Exclusivity registries for one chaos run.
///
/// A node is listed from the moment a latency or bandwidth fault is applied
/// until the step that reverses it has executed. Every `run_chaos` call
/// starts with an empty context.
#[derive(Debug, Clone, Default)]
pub struct ChaosContext {
    latency_affected: BTreeSet<NodeId>,
    bandwidth_affected: BTreeSet<NodeId>,
}

impl ChaosContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_latency_affected(&self, node: NodeId) -> bool {
        self.latency_affected.contains(&node)
    }

    pub fn is_bandwidth_affected(&self, node: NodeId) -> bool {
        self.bandwidth_affected.contains(&node)
    }

    pub fn latency_affected(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.latency_affected.iter().copied()
    }

    pub fn bandwidth_affected(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bandwidth_affected.iter().copied()
    }

    pub(crate) fn mark_latency(&mut self, node: NodeId) {
        self.latency_affected.insert(node);
    }

    pub(crate) fn clear_latency(&mut self, node: NodeId) {
        self.latency_affected.remove(&node);
    }

    pub(crate) fn mark_bandwidth(&mut self, node: NodeId) {
        self.bandwidth_affected.insert(node);
    }

    pub(crate) fn clear_bandwidth(&mut self, node: NodeId) {
        self.bandwidth_affected.remove(&node);
    }

    /// Whether no node carries a registered fault.
    pub fn is_empty(&self) -> bool {
        self.latency_affected.is_empty() && self.bandwidth_affected.is_empty()
    }
}
