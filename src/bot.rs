//! The chaos scheduling engine.
//!
//! [`ChaosBot`] is a discrete-event loop over two interleaved sources:
//! periodic experiment spawns and the reversal steps those experiments
//! return. Both share one time-ordered queue; entries with equal timestamps
//! run in insertion order.
//!
//! A run moves through `Idle -> Running -> Draining -> Stopped`. Once the
//! run duration has elapsed no new experiment is spawned, but every pending
//! step still executes so that each applied fault is undone.

use crate::clock::{Clock, Timestamp};
use crate::config::ChaosBotConfiguration;
use crate::context::ChaosContext;
use crate::error::{ChaosError, Result};
use crate::network::Network;
use crate::random::ChaosRng;
use crate::step::StepAction;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

/// Shortest gap between two spawn events, so virtual time always advances.
const MIN_SPAWN_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// State and history
// ============================================================================

/// Lifecycle of the engine within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    /// No run has been started yet.
    Idle,
    /// Spawning experiments and executing steps.
    Running,
    /// Run duration elapsed; only pending steps execute.
    Draining,
    /// Queue empty, or the run was aborted by a failed step.
    Stopped,
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BotState::Idle => "idle",
            BotState::Running => "running",
            BotState::Draining => "draining",
            BotState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChaosEvent {
    ExperimentSpawned {
        at: Timestamp,
        experiment: &'static str,
        steps: usize,
    },
    NoEligibleTarget {
        at: Timestamp,
        experiment: &'static str,
    },
    SpawnFailed {
        at: Timestamp,
        experiment: &'static str,
        reason: String,
    },
    StepExecuted {
        at: Timestamp,
        action: StepAction,
    },
    RunFinished {
        at: Timestamp,
        stats: RunStats,
    },
}

/// Counters for the most recent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Experiments that applied a fault.
    pub experiments_spawned: u64,
    /// Spawn cycles where the chosen experiment found no target.
    pub no_eligible_target: u64,
    /// Spawn cycles where the network rejected the fault.
    pub spawn_failures: u64,
    /// Reversal or continuation steps executed.
    pub steps_executed: u64,
}

// ============================================================================
// Event queue
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Spawn,
    Step(StepAction),
    RunDeadline,
}

#[derive(Debug)]
struct Scheduled {
    at: Timestamp,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

/// Min-queue ordered by timestamp, then insertion order.
#[derive(Debug, Default)]
struct EventQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl EventQueue {
    fn push(&mut self, at: Timestamp, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled { at, seq, event }));
    }

    fn pop(&mut self) -> Option<Scheduled> {
        self.heap.pop().map(|Reverse(s)| s)
    }

    fn pending_steps(&self) -> usize {
        self.heap
            .iter()
            .filter(|Reverse(s)| matches!(s.event, Event::Step(_)))
            .count()
    }
}

// ============================================================================
// Chaos bot
// ============================================================================

/// Schedules randomly chosen experiments against a network for a bounded
/// amount of time.
pub struct ChaosBot<N: Network, C: Clock> {
    network: N,
    clock: C,
    config: ChaosBotConfiguration,
    state: BotState,
    stats: RunStats,
    history: Vec<ChaosEvent>,
}

impl<N: Network, C: Clock> ChaosBot<N, C> {
    pub fn new(network: N, clock: C, config: ChaosBotConfiguration) -> Self {
        Self {
            network,
            clock,
            config,
            state: BotState::Idle,
            stats: RunStats::default(),
            history: Vec::new(),
        }
    }

    /// Run chaos for `duration`, then drain every pending step.
    ///
    /// Returns once all applied faults have been reversed. A step that fails
    /// aborts the run with [`ChaosError::StepFailed`]; the steps still pending
    /// at that point are dropped.
    pub fn run_chaos(&mut self, duration: Duration) -> Result<()> {
        let mut rng = ChaosRng::from_seed(self.config.seed());
        let span = info_span!("chaos_run", seed = rng.seed());
        let _guard = span.enter();

        let mut ctx = ChaosContext::new();
        let mut queue = EventQueue::default();
        let start = self.clock.now();
        let end = start + duration;

        self.stats = RunStats::default();
        self.history.clear();
        self.state = BotState::Running;
        info!(
            seed = rng.seed(),
            ?duration,
            experiments = self.config.experiments().len(),
            "Chaos run started"
        );

        queue.push(end, Event::RunDeadline);
        if self.config.experiments().is_empty() {
            info!("No experiments configured, nothing will be spawned");
        } else {
            let first = start + self.next_interval(&mut rng);
            if first < end {
                queue.push(first, Event::Spawn);
            }
        }

        while let Some(item) = queue.pop() {
            self.clock.advance_to(item.at);
            let now = item.at;

            match item.event {
                Event::RunDeadline => {
                    self.state = BotState::Draining;
                    info!(pending = queue.pending_steps(), "Run duration elapsed, draining");
                }
                Event::Spawn => {
                    let next = now + self.next_interval(&mut rng);
                    if next > end {
                        debug!(%now, "Next spawn window exceeds the run, spawning stopped");
                        continue;
                    }
                    self.spawn(now, &mut ctx, &mut rng, &mut queue);
                    if next < end {
                        queue.push(next, Event::Spawn);
                    }
                }
                Event::Step(action) => {
                    if let Err(e) = action.execute(&mut self.network, &mut ctx) {
                        self.state = BotState::Stopped;
                        error!(
                            %action,
                            at = %now,
                            error = %e,
                            abandoned = queue.pending_steps(),
                            "Failed to execute step, aborting run"
                        );
                        return Err(ChaosError::StepFailed {
                            action: action.to_string(),
                            at: now,
                            source: Box::new(e),
                        });
                    }
                    self.stats.steps_executed += 1;
                    self.history.push(ChaosEvent::StepExecuted { at: now, action });
                    debug!(%action, at = %now, "Step executed");
                }
            }
        }

        self.state = BotState::Stopped;
        let at = self.clock.now();
        self.history.push(ChaosEvent::RunFinished {
            at,
            stats: self.stats,
        });
        info!(
            spawned = self.stats.experiments_spawned,
            no_op = self.stats.no_eligible_target,
            failed = self.stats.spawn_failures,
            steps = self.stats.steps_executed,
            "Chaos run finished"
        );
        Ok(())
    }

    fn next_interval(&self, rng: &mut ChaosRng) -> Duration {
        rng.next_duration(self.config.min_interval(), self.config.max_interval())
            .max(MIN_SPAWN_INTERVAL)
    }

    fn spawn(
        &mut self,
        now: Timestamp,
        ctx: &mut ChaosContext,
        rng: &mut ChaosRng,
        queue: &mut EventQueue,
    ) {
        let experiments = self.config.experiments();
        let experiment = &experiments[rng.next_int(experiments.len())];
        let name = experiment.name();

        match experiment.start(&mut self.network, ctx, now, rng) {
            Ok(steps) if steps.is_empty() => {
                info!(experiment = name, at = %now, "No eligible target");
                self.stats.no_eligible_target += 1;
                self.history.push(ChaosEvent::NoEligibleTarget {
                    at: now,
                    experiment: name,
                });
            }
            Ok(steps) => {
                debug!(experiment = name, at = %now, steps = steps.len(), "Experiment spawned");
                self.stats.experiments_spawned += 1;
                self.history.push(ChaosEvent::ExperimentSpawned {
                    at: now,
                    experiment: name,
                    steps: steps.len(),
                });
                for step in steps {
                    queue.push(step.timestamp.max(now), Event::Step(step.action));
                }
            }
            Err(e) => {
                warn!(experiment = name, at = %now, error = %e, "Experiment failed to start, skipping cycle");
                self.stats.spawn_failures += 1;
                self.history.push(ChaosEvent::SpawnFailed {
                    at: now,
                    experiment: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    /// Counters of the most recent run.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Events of the most recent run, in execution order.
    pub fn history(&self) -> &[ChaosEvent] {
        &self.history
    }

    pub fn config(&self) -> &ChaosBotConfiguration {
        &self.config
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_network(self) -> N {
        self.network
    }
}
