//! Configuration module for the chaos bot.

use crate::error::{ChaosError, Result};
use crate::experiment::Experiment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Scheduling policy for a chaos run.
///
/// The value is immutable: every `with_*` method returns a new configuration.
/// `min_interval <= max_interval` always holds for values built through the
/// constructors and builders; files are checked by [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosBotConfiguration {
    /// Shortest wait between two experiment spawns.
    #[serde(with = "humantime_serde")]
    min_interval: Duration,
    /// Longest wait between two experiment spawns.
    #[serde(with = "humantime_serde")]
    max_interval: Duration,
    /// Seed for the run's random stream. Unseeded runs draw one from entropy.
    seed: Option<u64>,
    /// Experiments to choose from, uniformly.
    experiments: Vec<Experiment>,
}

impl Default for ChaosBotConfiguration {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(30),
            max_interval: Duration::from_secs(90),
            seed: None,
            experiments: Experiment::defaults(),
        }
    }
}

impl ChaosBotConfiguration {
    /// Default configuration with the given spawn interval. Reversed bounds
    /// are swapped.
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        let (min_interval, max_interval) = if min_interval <= max_interval {
            (min_interval, max_interval)
        } else {
            (max_interval, min_interval)
        };
        Self {
            min_interval,
            max_interval,
            ..Self::default()
        }
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_json_str(&content)
    }

    /// Parse and validate configuration from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| {
            ChaosError::Config(format!("Failed to parse config: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.min_interval > self.max_interval {
            return Err(ChaosError::InvalidConfig {
                field: "min_interval".to_string(),
                reason: format!(
                    "Minimum interval {:?} exceeds maximum interval {:?}",
                    self.min_interval, self.max_interval
                ),
            });
        }
        if self.max_interval.is_zero() {
            return Err(ChaosError::invalid_config(
                "max_interval",
                "Maximum interval must be greater than zero",
            ));
        }

        for experiment in &self.experiments {
            experiment.validate()?;
        }

        Ok(())
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// New minimum interval. Raises the maximum if it would fall below.
    pub fn with_min_interval(&self, min_interval: Duration) -> Self {
        Self {
            min_interval,
            max_interval: self.max_interval.max(min_interval),
            ..self.clone()
        }
    }

    /// New maximum interval. Lowers the minimum if it would rise above.
    pub fn with_max_interval(&self, max_interval: Duration) -> Self {
        Self {
            min_interval: self.min_interval.min(max_interval),
            max_interval,
            ..self.clone()
        }
    }

    /// Spawn at a fixed interval.
    pub fn with_interval(&self, interval: Duration) -> Self {
        Self {
            min_interval: interval,
            max_interval: interval,
            ..self.clone()
        }
    }

    pub fn with_seed(&self, seed: Option<u64>) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    pub fn with_experiments(&self, experiments: Vec<Experiment>) -> Self {
        Self {
            experiments,
            ..self.clone()
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    pub log_level: String,
    /// Enable JSON logging.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Serde helper for Duration using humantime format.
pub mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() % 1_000_000 == 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}ns", duration.as_nanos()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Parse `"1500ns"`, `"250ms"`, `"30s"`, `"2m"`, `"1h"` or a bare
    /// millisecond count.
    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if let Some(ns) = s.strip_suffix("ns") {
            ns.trim()
                .parse::<u64>()
                .map(Duration::from_nanos)
                .map_err(|e| format!("invalid duration {:?}: {}", s, e))
        } else if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| format!("invalid duration {:?}: {}", s, e))
        } else if let Some(s_val) = s.strip_suffix('s') {
            s_val
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| format!("invalid duration {:?}: {}", s, e))
        } else if let Some(m) = s.strip_suffix('m') {
            m.trim()
                .parse::<u64>()
                .map(|v| Duration::from_secs(v.saturating_mul(60)))
                .map_err(|e| format!("invalid duration {:?}: {}", s, e))
        } else if let Some(h) = s.strip_suffix('h') {
            h.trim()
                .parse::<u64>()
                .map(|v| Duration::from_secs(v.saturating_mul(3600)))
                .map_err(|e| format!("invalid duration {:?}: {}", s, e))
        } else {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| format!("invalid duration {:?}: {}", s, e))
        }
    }
}
