//! Core type definitions shared by the network, the experiments and the
//! scheduling engine.
//!
//! # Key Types
//!
//! - [`NodeId`]: identity reference to one participant in the network
//! - [`PartitionId`]: opaque handle to a partition created on the network
//! - [`Partition`]: snapshot of a partition and its members
//! - [`LatencyRange`]: latency applied to every connection of a node
//! - [`BandwidthLimit`]: throughput cap applied to every connection of a node
//!
//! # Examples
//!
//! ```rust
//! use chaosbot::types::{BandwidthLimit, LatencyRange};
//! use std::time::Duration;
//!
//! let range = LatencyRange::around(Duration::from_millis(200), 0.1);
//! assert_eq!(range.min, Duration::from_millis(180));
//! assert_eq!(range.max, Duration::from_millis(220));
//!
//! let limit = BandwidthLimit::of_kilobytes_per_second(512);
//! assert_eq!(limit.kilobytes_per_second(), 512);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Unique identifier for a network node.
pub type NodeId = u64;

/// Opaque handle returned by the network when a partition is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub u64);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition-{}", self.0)
    }
}

/// A group of nodes that can only talk among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Handle used to remove the partition.
    pub id: PartitionId,
    /// Member nodes, in ascending order.
    pub nodes: BTreeSet<NodeId>,
}

impl Partition {
    pub fn new(id: PartitionId, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            id,
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

/// Latency applied to a connection, drawn per message from `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyRange {
    pub min: Duration,
    pub max: Duration,
}

impl LatencyRange {
    /// Create a range, swapping the bounds if they are reversed.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A range centred on `latency`, spreading `jitter` (a fraction) both ways.
    pub fn around(latency: Duration, jitter: f64) -> Self {
        let jitter = jitter.clamp(0.0, 1.0);
        let spread = latency.mul_f64(jitter);
        Self {
            min: latency.saturating_sub(spread),
            max: latency + spread,
        }
    }
}

impl fmt::Display for LatencyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..={:?}", self.min, self.max)
    }
}

/// Throughput cap for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthLimit {
    kilobytes_per_second: u64,
}

impl BandwidthLimit {
    pub const UNLIMITED: BandwidthLimit = BandwidthLimit {
        kilobytes_per_second: u64::MAX,
    };

    pub fn of_kilobytes_per_second(kilobytes_per_second: u64) -> Self {
        Self {
            kilobytes_per_second,
        }
    }

    pub fn of_megabytes_per_second(megabytes_per_second: u64) -> Self {
        Self::of_kilobytes_per_second(megabytes_per_second.saturating_mul(1024))
    }

    pub fn kilobytes_per_second(&self) -> u64 {
        self.kilobytes_per_second
    }

    pub fn is_unlimited(&self) -> bool {
        *self == Self::UNLIMITED
    }
}

impl fmt::Display for BandwidthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            write!(f, "unlimited")
        } else {
            write!(f, "{} KB/s", self.kilobytes_per_second)
        }
    }
}
