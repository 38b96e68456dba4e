//! Common test utilities for integration tests.

pub mod failing_network;
pub mod fixtures;

// Re-export common types
pub use failing_network::*;
pub use fixtures::*;
