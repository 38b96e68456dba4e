//! Seedable random source shared by the engine and every experiment.
//!
//! A single [`ChaosRng`] stream drives interval draws, experiment selection,
//! target selection and magnitude draws, so a seed fully determines a run.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::time::Duration;

/// Random source used by chaos runs.
#[derive(Debug, Clone)]
pub struct ChaosRng {
    rng: StdRng,
    seed: u64,
}

impl ChaosRng {
    /// Create a generator that reproduces the same stream for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a generator from a fresh entropy-derived seed.
    ///
    /// The seed is kept so a surprising run can be replayed.
    pub fn from_entropy() -> Self {
        let seed = rand::thread_rng().next_u64();
        Self::seeded(seed)
    }

    /// Build from an optional seed.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Seed the stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[0, bound)`. Returns 0 when `bound` is 0.
    pub fn next_int(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform value in `[min, max)`. Returns `min` for an empty range.
    pub fn next_f64_in(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        min + (max - min) * self.next_double()
    }

    /// Uniform duration in `[min, max]`, at nanosecond resolution.
    pub fn next_duration(&mut self, min: Duration, max: Duration) -> Duration {
        if min >= max {
            return min;
        }
        let lo = duration_nanos(min);
        let hi = duration_nanos(max);
        Duration::from_nanos(self.rng.gen_range(lo..=hi))
    }

    /// Uniform integer in `[min, max]`.
    pub fn next_u64_in(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// `count` independent uniform integers in `[origin, bound)`.
    ///
    /// Values may repeat.
    pub fn ints(&mut self, count: usize, origin: usize, bound: usize) -> Vec<usize> {
        if origin >= bound {
            return vec![origin; count];
        }
        (0..count).map(|_| self.rng.gen_range(origin..bound)).collect()
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
