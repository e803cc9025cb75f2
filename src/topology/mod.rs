//! Network topology module.
//!
//! This module reconstructs the device graph from interface addressing and
//! answers the graph queries the validator and load estimator rely on:
//! hierarchy tiers, shortest and alternate paths, cycles and summary metrics.

pub mod adjacency;
pub mod builder;
pub mod cycles;
pub mod paths;
pub mod types;

// Re-export key types and functions for easier access
pub use adjacency::may_connect;
pub use builder::Topology;
pub use types::{DeviceNode, Hierarchy, Link, LinkEnd, NetworkInfo, Tier};
