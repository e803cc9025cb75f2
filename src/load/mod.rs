//! Load Estimator.
//!
//! Assigns synthetic demand to every link, flags overloaded links and
//! recommends ECMP, capacity upgrades or QoS.

pub mod estimator;
pub mod types;

pub use estimator::{analyze_traffic_load, classify, estimate_link_demand, utilization};
pub use types::*;
