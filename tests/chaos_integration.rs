//! Chaos bot integration tests.
//!
//! Full runs against simulated, recording and failing networks, checking
//! scheduling, determinism, cleanup and error propagation.

#[allow(dead_code)]
mod common;

use std::collections::BTreeSet;
use std::io::Write;
use std::time::Duration;

use chaosbot::experiment::{
    HighLatencyNodeExperiment, LowBandwidthNodeExperiment, NetworkPartitionExperiment,
    NodeFailureExperiment,
};
use chaosbot::{
    BotState, ChaosBot, ChaosBotConfiguration, ChaosError, ChaosEvent, Network, NetworkCall,
    SimulatedNetwork, VirtualClock, WallClock,
};
use common::{busy_config, recording_bot, replay, FailingNetwork, Operation};

// =============================================================================
// Scheduling Tests
// =============================================================================

#[test]
fn test_single_node_failure_scenario() {
    let config = ChaosBotConfiguration::default()
        .with_interval(Duration::from_secs(5))
        .with_seed(Some(2024))
        .with_experiments(vec![NodeFailureExperiment::new(
            Duration::from_secs(10),
            Duration::from_secs(10),
        )
        .into()]);
    let mut bot = recording_bot(4, config);

    bot.run_chaos(Duration::from_secs(12)).unwrap();

    let calls = bot.network().calls();
    assert_eq!(calls.len(), 2, "calls: {:?}", calls);

    let (killed_at, kill) = &calls[0];
    let (started_at, start) = &calls[1];
    assert_eq!(killed_at.elapsed(), Duration::from_secs(5));
    assert_eq!(started_at.elapsed(), Duration::from_secs(15));
    match (kill, start) {
        (NetworkCall::KillImmediately { node: a }, NetworkCall::StartNode { node: b }) => {
            assert_eq!(a, b)
        }
        other => panic!("unexpected calls {:?}", other),
    }

    for event in bot.history() {
        if let ChaosEvent::ExperimentSpawned { at, .. } = event {
            assert!(at.elapsed() < Duration::from_secs(12));
        }
    }
    assert_eq!(bot.state(), BotState::Stopped);
    assert!(bot.network().inner().is_pristine());
}

#[test]
fn test_calls_are_time_ordered() {
    let mut bot = recording_bot(7, busy_config(5));

    bot.run_chaos(Duration::from_secs(600)).unwrap();

    let calls = bot.network().calls();
    assert!(!calls.is_empty());
    assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[test]
fn test_no_spawn_after_run_end() {
    let mut bot = recording_bot(6, busy_config(8));
    let run = Duration::from_secs(300);

    bot.run_chaos(run).unwrap();

    let spawned: Vec<_> = bot
        .history()
        .iter()
        .filter_map(|e| match e {
            ChaosEvent::ExperimentSpawned { at, .. }
            | ChaosEvent::NoEligibleTarget { at, .. }
            | ChaosEvent::SpawnFailed { at, .. } => Some(at.elapsed()),
            _ => None,
        })
        .collect();
    assert!(!spawned.is_empty());
    assert!(spawned.iter().all(|at| *at < run));
}

// =============================================================================
// Determinism Tests
// =============================================================================

#[test]
fn test_same_seed_same_calls() {
    let mut first = recording_bot(8, busy_config(77));
    let mut second = recording_bot(8, busy_config(77));

    first.run_chaos(Duration::from_secs(1800)).unwrap();
    second.run_chaos(Duration::from_secs(1800)).unwrap();

    assert_eq!(first.network().calls(), second.network().calls());
    assert_eq!(first.history(), second.history());

    let a = serde_json::to_string(first.network().calls()).unwrap();
    let b = serde_json::to_string(second.network().calls()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_different_seeds_diverge() {
    let mut first = recording_bot(8, busy_config(1));
    let mut second = recording_bot(8, busy_config(2));

    first.run_chaos(Duration::from_secs(1800)).unwrap();
    second.run_chaos(Duration::from_secs(1800)).unwrap();

    assert_ne!(first.network().calls(), second.network().calls());
}

// =============================================================================
// Cleanup Tests
// =============================================================================

#[test]
fn test_drain_leaves_network_pristine() {
    for seed in 0..10 {
        let mut bot = recording_bot(6, busy_config(seed));

        bot.run_chaos(Duration::from_secs(900)).unwrap();

        assert!(bot.network().inner().is_pristine(), "seed {}", seed);
        assert!(bot.stats().experiments_spawned > 0, "seed {}", seed);
    }
}

#[test]
fn test_faults_reversed_after_run_end() {
    let config = ChaosBotConfiguration::default()
        .with_interval(Duration::from_secs(1))
        .with_seed(Some(4))
        .with_experiments(vec![NodeFailureExperiment::new(
            Duration::from_secs(100),
            Duration::from_secs(100),
        )
        .into()]);
    let mut bot = recording_bot(3, config);

    bot.run_chaos(Duration::from_secs(5)).unwrap();

    let restarts: Vec<_> = bot
        .network()
        .calls()
        .iter()
        .filter(|(_, c)| matches!(c, NetworkCall::StartNode { .. }))
        .map(|(at, _)| at.elapsed())
        .collect();
    assert_eq!(restarts.len(), 3);
    assert!(restarts.iter().all(|at| *at > Duration::from_secs(100)));
    assert!(bot.network().inner().is_pristine());
}

// =============================================================================
// Exclusivity Tests
// =============================================================================

#[test]
fn test_latency_and_bandwidth_faults_are_exclusive() {
    let config = ChaosBotConfiguration::new(Duration::from_secs(1), Duration::from_secs(3))
        .with_seed(Some(31))
        .with_experiments(vec![
            HighLatencyNodeExperiment::default().into(),
            LowBandwidthNodeExperiment::default().into(),
        ]);
    let mut bot = recording_bot(4, config);

    bot.run_chaos(Duration::from_secs(600)).unwrap();

    let mut slowed = BTreeSet::new();
    let mut throttled = BTreeSet::new();
    for (at, call) in bot.network().calls() {
        match call {
            NetworkCall::SetLatency { node, .. } => {
                assert!(slowed.insert(*node), "node {} slowed twice at {}", node, at)
            }
            NetworkCall::RestoreLatency { node } => assert!(slowed.remove(node)),
            NetworkCall::SetBandwidth { node, .. } => {
                assert!(throttled.insert(*node), "node {} throttled twice at {}", node, at)
            }
            NetworkCall::RestoreBandwidth { node } => assert!(throttled.remove(node)),
            other => panic!("unexpected call {}", other),
        }
    }
    assert!(slowed.is_empty() && throttled.is_empty());
    assert!(bot.stats().no_eligible_target > 0);
}

#[test]
fn test_partition_limit_holds_during_run() {
    let config = ChaosBotConfiguration::new(Duration::from_secs(1), Duration::from_secs(2))
        .with_seed(Some(12))
        .with_experiments(vec![NetworkPartitionExperiment::default()
            .with_max_partitions(4)
            .into()]);
    let mut bot = recording_bot(16, config);

    bot.run_chaos(Duration::from_secs(600)).unwrap();

    let mut most = 0;
    replay(16, bot.network().calls(), |network, _| {
        let live = network.network_partitions().len();
        assert!(live <= 4, "{} partitions", live);
        most = most.max(live);
    });
    assert_eq!(most, 4);
    assert!(bot.network().inner().is_pristine());
}

#[test]
fn test_replay_of_busy_run_ends_pristine() {
    let mut bot = recording_bot(6, busy_config(99));

    bot.run_chaos(Duration::from_secs(600)).unwrap();

    let mut last = None;
    replay(6, bot.network().calls(), |network, _| {
        last = Some(network.is_pristine());
    });
    assert_eq!(last, Some(true));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_failed_reversal_is_fatal() {
    let config = ChaosBotConfiguration::default()
        .with_interval(Duration::from_secs(5))
        .with_seed(Some(1))
        .with_experiments(vec![NodeFailureExperiment::new(
            Duration::from_secs(10),
            Duration::from_secs(10),
        )
        .into()]);
    let network = FailingNetwork::new(SimulatedNetwork::new(4)).failing(Operation::Start);
    let mut bot = ChaosBot::new(network, VirtualClock::new(), config);

    let err = bot.run_chaos(Duration::from_secs(60)).unwrap_err();

    assert!(err.is_fatal());
    match &err {
        ChaosError::StepFailed { action, at, source } => {
            assert!(action.starts_with("start_node("));
            assert_eq!(at.elapsed(), Duration::from_secs(15));
            assert!(matches!(**source, ChaosError::Network(_)));
        }
        other => panic!("unexpected error {}", other),
    }
    assert_eq!(bot.state(), BotState::Stopped);
    assert_eq!(bot.network().failures(), 1);
    assert_eq!(bot.network().inner().alive_count(), 2);
}

#[test]
fn test_spawn_failure_skips_cycle() {
    let config = ChaosBotConfiguration::default()
        .with_interval(Duration::from_secs(5))
        .with_seed(Some(6))
        .with_experiments(vec![
            NodeFailureExperiment::new(Duration::from_secs(3), Duration::from_secs(3)).into(),
            HighLatencyNodeExperiment::new(Duration::from_secs(3), Duration::from_secs(3)).into(),
        ]);
    let network = FailingNetwork::new(SimulatedNetwork::new(4)).failing(Operation::Kill);
    let mut bot = ChaosBot::new(network, VirtualClock::new(), config);

    bot.run_chaos(Duration::from_secs(300)).unwrap();

    let stats = bot.stats();
    assert!(stats.spawn_failures > 0);
    assert!(stats.experiments_spawned > 0);
    assert_eq!(stats.spawn_failures as usize, bot.network().failures());
    assert!(bot
        .history()
        .iter()
        .any(|e| matches!(e, ChaosEvent::SpawnFailed { experiment: "node-failure", .. })));
    assert!(bot.network().inner().is_pristine());
}

// =============================================================================
// Configuration and Clock Tests
// =============================================================================

#[test]
fn test_run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "min_interval": "2s",
            "max_interval": "4s",
            "seed": 5,
            "experiments": [
                {{"kind": "node_isolation", "min_duration": "1s", "max_duration": "3s"}},
                {{"kind": "flickering_isolation", "min_duration": "5s", "max_duration": "10s"}}
            ]
        }}"#
    )
    .unwrap();

    let config = ChaosBotConfiguration::from_file(file.path()).unwrap();
    let mut bot = recording_bot(5, config);
    bot.run_chaos(Duration::from_secs(120)).unwrap();

    assert!(bot.stats().experiments_spawned > 0);
    assert!(bot
        .network()
        .calls()
        .iter()
        .all(|(_, c)| matches!(c, NetworkCall::Isolate { .. } | NetworkCall::Rejoin { .. })));
    assert!(bot.network().inner().is_pristine());
}

#[test]
fn test_wall_clock_run() {
    let config = ChaosBotConfiguration::default()
        .with_interval(Duration::from_millis(10))
        .with_seed(Some(3))
        .with_experiments(vec![NodeFailureExperiment::new(
            Duration::from_millis(5),
            Duration::from_millis(15),
        )
        .into()]);
    let mut bot = ChaosBot::new(SimulatedNetwork::new(3), WallClock::new(), config);

    let started = std::time::Instant::now();
    bot.run_chaos(Duration::from_millis(60)).unwrap();

    assert!(started.elapsed() >= Duration::from_millis(40));
    assert!(bot.stats().experiments_spawned > 0);
    assert!(bot.network().is_pristine());
}
