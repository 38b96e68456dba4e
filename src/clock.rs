//! Time sources for the chaos engine.
//!
//! The engine never sleeps on its own. It asks a [`Clock`] to advance to the
//! next deadline, which lets the same run execute under a [`VirtualClock`]
//! (tests, deterministic replays) or a [`WallClock`] (live clusters).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A point in time, measured as an offset from the clock's epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "crate::config::humantime_serde")] Duration);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(Duration::ZERO);

    /// Offset from the clock's epoch.
    pub fn elapsed(&self) -> Duration {
        self.0
    }

    /// Time from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<Duration> for Timestamp {
    fn from(offset: Duration) -> Self {
        Timestamp(offset)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T+{:?}", self.0)
    }
}

/// Source of time for the scheduling engine.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Timestamp;

    /// Move time forward to `deadline`. A deadline in the past is a no-op.
    fn advance_to(&mut self, deadline: Timestamp);
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn advance_to(&mut self, deadline: Timestamp) {
        (**self).advance_to(deadline)
    }
}

/// Deterministic clock that jumps straight to each deadline.
///
/// Clones share the same time, so an instrumented network can read the
/// engine's current time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock();
        *now = *now + duration;
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }

    fn advance_to(&mut self, deadline: Timestamp) {
        let mut now = self.now.lock();
        if deadline > *now {
            *now = deadline;
        }
    }
}

/// Real-time clock that blocks the calling thread until each deadline.
#[derive(Debug, Clone)]
pub struct WallClock {
    epoch: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.epoch.elapsed())
    }

    fn advance_to(&mut self, deadline: Timestamp) {
        let remaining = deadline - self.now();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_clock_only_moves_forward() {
        let mut clock = VirtualClock::new();
        clock.advance_to(Timestamp::from(Duration::from_secs(10)));
        assert_eq!(clock.now().elapsed(), Duration::from_secs(10));

        clock.advance_to(Timestamp::from(Duration::from_secs(3)));
        assert_eq!(clock.now().elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_virtual_clock_clones_share_time() {
        let mut clock = VirtualClock::new();
        let observer = clock.clone();

        clock.advance_to(Timestamp::from(Duration::from_secs(5)));
        observer.advance(Duration::from_secs(1));

        assert_eq!(clock.now(), observer.now());
        assert_eq!(clock.now().elapsed(), Duration::from_secs(6));
    }

    #[test]
    fn test_wall_clock_waits_for_deadline() {
        let mut clock = WallClock::new();
        let deadline = clock.now() + Duration::from_millis(20);
        clock.advance_to(deadline);
        assert!(clock.now() >= deadline);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let t = Timestamp::EPOCH + Duration::from_secs(15);
        assert_eq!(t - Timestamp::from(Duration::from_secs(5)), Duration::from_secs(10));
        assert_eq!(Timestamp::EPOCH - t, Duration::ZERO);
        assert_eq!(t.to_string(), "T+15s");
    }

    #[test]
    fn test_timestamp_serializes_as_millis() {
        let t = Timestamp::from(Duration::from_millis(1500));
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"1500ms\"");
        let back: Timestamp = serde_json::from_str("\"1500ms\"").unwrap();
        assert_eq!(back, t);
    }
}
