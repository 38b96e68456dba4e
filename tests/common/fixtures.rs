// Test fixtures for chaos runs

use chaosbot::experiment::{
    FlickeringIsolationExperiment, HighLatencyNodeExperiment, LowBandwidthNodeExperiment,
    NetworkPartitionExperiment, NodeFailureExperiment, NodeIsolationExperiment,
};
use chaosbot::{
    ChaosBot, ChaosBotConfiguration, Experiment, Network, NetworkCall, RecordingNetwork,
    SimulatedNetwork, Timestamp, VirtualClock,
};
use std::time::Duration;

pub type RecordingBot = ChaosBot<RecordingNetwork<SimulatedNetwork>, VirtualClock>;

/// A bot over `nodes` simulated nodes whose calls are recorded against a
/// shared virtual clock.
pub fn recording_bot(nodes: usize, config: ChaosBotConfiguration) -> RecordingBot {
    let clock = VirtualClock::new();
    let network = RecordingNetwork::new(SimulatedNetwork::new(nodes), clock.clone());
    ChaosBot::new(network, clock, config)
}

/// Every experiment kind, with durations short enough for many to overlap
/// in a few minutes of virtual time.
pub fn all_experiments() -> Vec<Experiment> {
    let short = |min, max| (Duration::from_secs(min), Duration::from_secs(max));
    let (min, max) = short(5, 40);
    vec![
        NodeFailureExperiment::new(min, max).into(),
        NodeIsolationExperiment::new(min, max).into(),
        FlickeringIsolationExperiment::new(min, max).into(),
        HighLatencyNodeExperiment::new(min, max).into(),
        LowBandwidthNodeExperiment::new(min, max).into(),
        NetworkPartitionExperiment::new(min, max).into(),
    ]
}

/// A busy configuration: every experiment kind, spawning every 2-6 seconds.
pub fn busy_config(seed: u64) -> ChaosBotConfiguration {
    ChaosBotConfiguration::new(Duration::from_secs(2), Duration::from_secs(6))
        .with_seed(Some(seed))
        .with_experiments(all_experiments())
}

/// Re-apply recorded calls to a fresh network, calling `check` after each.
///
/// Partition ids are allocated in call order, so a replay reproduces the
/// ids the original run saw.
pub fn replay<F>(nodes: usize, calls: &[(Timestamp, NetworkCall)], mut check: F)
where
    F: FnMut(&SimulatedNetwork, &NetworkCall),
{
    let mut network = SimulatedNetwork::new(nodes);
    for (_, call) in calls {
        let result = match call {
            NetworkCall::KillImmediately { node } => network.kill_immediately(*node),
            NetworkCall::StartNode { node } => network.start_node(*node),
            NetworkCall::Isolate { node } => network.isolate(*node).map(|_| ()),
            NetworkCall::Rejoin { node } => network.rejoin(*node),
            NetworkCall::SetLatency { node, range } => {
                network.set_latency_for_all_connections(*node, *range)
            }
            NetworkCall::RestoreLatency { node } => network.restore_latency_for_all_connections(*node),
            NetworkCall::SetBandwidth { node, limit } => {
                network.set_bandwidth_for_all_connections(*node, *limit)
            }
            NetworkCall::RestoreBandwidth { node } => {
                network.restore_bandwidth_limits_for_all_connections(*node)
            }
            NetworkCall::CreatePartition { nodes } => {
                network.create_network_partition(nodes).map(|_| ())
            }
            NetworkCall::RemovePartition { partition } => {
                network.remove_network_partition(*partition)
            }
        };
        result.unwrap_or_else(|e| panic!("replaying {} failed: {}", call, e));
        check(&network, call);
    }
}
