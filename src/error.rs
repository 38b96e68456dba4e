//! Error types for the chaos bot.
//!
//! This module provides a unified error type [`ChaosError`] for every chaos
//! operation, along with a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Network**: the injected network rejected a mutation
//! - **Scheduling**: a scheduled reversal step could not be executed
//! - **Configuration**: invalid bounds or malformed configuration files
//! - **IO**: configuration files that cannot be read
//!
//! # Example
//!
//! ```rust
//! use chaosbot::error::{ChaosError, Result};
//!
//! fn check_fraction(fraction: f64) -> Result<()> {
//!     if !(0.0..=1.0).contains(&fraction) {
//!         return Err(ChaosError::InvalidArgument(format!(
//!             "fraction {} outside [0, 1]",
//!             fraction
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_fraction(0.5).is_ok());
//! assert!(!check_fraction(1.5).unwrap_err().is_fatal());
//! ```

use crate::clock::Timestamp;
use crate::types::{NodeId, PartitionId};
use std::io;
use thiserror::Error;

/// Main error type for chaos operations.
#[derive(Error, Debug)]
pub enum ChaosError {
    // Network errors
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Partition not found: {0}")]
    PartitionNotFound(PartitionId),

    #[error("Network error: {0}")]
    Network(String),

    // Scheduling errors
    #[error("Step {action} scheduled at {at} failed: {source}")]
    StepFailed {
        action: String,
        at: Timestamp,
        #[source]
        source: Box<ChaosError>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // External errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChaosError {
    /// Whether the error leaves the network in a degraded state.
    ///
    /// A failed reversal means some isolation, throttle, partition or kill
    /// could not be undone, so the run must not continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChaosError::StepFailed { .. })
    }

    pub(crate) fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ChaosError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ChaosError {
    fn from(e: serde_json::Error) -> Self {
        ChaosError::Serialization(e.to_string())
    }
}

/// Result type alias for chaos operations.
pub type Result<T> = std::result::Result<T, ChaosError>;
