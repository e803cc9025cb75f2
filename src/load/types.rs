//! Load analysis data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Traffic assumptions used by the demand heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficProfile {
    /// Demand every link starts with
    #[serde(default = "default_base_demand")]
    pub base_demand: u64,
    /// Added when either endpoint is a router
    #[serde(default = "default_router_increment")]
    pub router_increment: u64,
    /// Added when either endpoint name contains "core"
    #[serde(default = "default_core_increment")]
    pub core_increment: u64,
    /// Utilization above which a link is overloaded
    #[serde(default = "default_overload_threshold")]
    pub overload_threshold: f64,
    /// Capacity upgrade size as a multiple of current demand
    #[serde(default = "default_upgrade_factor")]
    pub upgrade_factor: f64,
    /// Per-endpoint-class demand assumptions (informational)
    #[serde(default = "default_endpoint_traffic")]
    pub endpoint_traffic: BTreeMap<String, u64>,
    /// Application classes and their priorities (informational)
    #[serde(default = "default_application_types")]
    pub application_types: BTreeMap<String, ApplicationClass>,
}

/// Priority and burst behaviour of an application class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationClass {
    pub priority: String,
    pub burst_factor: f64,
}

fn default_base_demand() -> u64 {
    10_000
}

fn default_router_increment() -> u64 {
    20_000
}

fn default_core_increment() -> u64 {
    30_000
}

fn default_overload_threshold() -> f64 {
    0.8
}

fn default_upgrade_factor() -> f64 {
    1.5
}

fn default_endpoint_traffic() -> BTreeMap<String, u64> {
    [
        ("web_server", 50_000),
        ("database", 30_000),
        ("user_devices", 5_000),
        ("backup_server", 20_000),
    ]
    .into_iter()
    .map(|(class, demand)| (class.to_string(), demand))
    .collect()
}

fn default_application_types() -> BTreeMap<String, ApplicationClass> {
    [("web", "medium", 2.0), ("database", "high", 1.5), ("backup", "low", 1.2)]
        .into_iter()
        .map(|(app, priority, burst_factor)| {
            (
                app.to_string(),
                ApplicationClass {
                    priority: priority.to_string(),
                    burst_factor,
                },
            )
        })
        .collect()
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            base_demand: default_base_demand(),
            router_increment: default_router_increment(),
            core_increment: default_core_increment(),
            overload_threshold: default_overload_threshold(),
            upgrade_factor: default_upgrade_factor(),
            endpoint_traffic: default_endpoint_traffic(),
            application_types: default_application_types(),
        }
    }
}

impl TrafficProfile {
    /// Check the numeric fields for usable values
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(self.overload_threshold > 0.0 && self.overload_threshold.is_finite()) {
            return Err(ProfileError::OverloadThreshold(self.overload_threshold));
        }
        if !(self.upgrade_factor >= 1.0 && self.upgrade_factor.is_finite()) {
            return Err(ProfileError::UpgradeFactor(self.upgrade_factor));
        }
        Ok(())
    }
}

/// Unusable traffic profile values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("overload_threshold must be a positive number, got {0}")]
    OverloadThreshold(f64),
    #[error("upgrade_factor must be at least 1.0, got {0}")]
    UpgradeFactor(f64),
}

/// Load classification of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Normal,
    Overloaded,
}

/// Estimated load on one link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLoad {
    /// Display id, `"<a>-<b>"`; not unique when device names contain `-`
    pub link: String,
    pub endpoints: (String, String),
    pub bandwidth: u64,
    pub demand: u64,
    pub utilization: f64,
    pub status: LinkStatus,
}

/// A link whose estimated utilization is above the overload threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadedLink {
    pub link: String,
    pub endpoints: (String, String),
    pub utilization: f64,
    pub bandwidth: u64,
    pub demand: u64,
}

/// Load balancing advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recommendation {
    /// Spread traffic over the non-primary paths
    LoadBalancing {
        overloaded_link: String,
        utilization: f64,
        recommendation: String,
        alternative_paths: Vec<Vec<String>>,
        suggested_action: String,
    },
    /// No alternative path: add capacity
    CapacityUpgrade {
        overloaded_link: String,
        utilization: f64,
        recommendation: String,
        current_bandwidth: u64,
        suggested_bandwidth: u64,
        suggested_action: String,
    },
    /// Network-wide prioritisation guidance
    Qos {
        recommendation: String,
        suggested_action: String,
        priority_classes: Vec<String>,
    },
}

impl Recommendation {
    pub fn kind(&self) -> &'static str {
        match self {
            Recommendation::LoadBalancing { .. } => "load_balancing",
            Recommendation::CapacityUpgrade { .. } => "capacity_upgrade",
            Recommendation::Qos { .. } => "qos",
        }
    }

    pub fn recommendation(&self) -> &str {
        match self {
            Recommendation::LoadBalancing { recommendation, .. }
            | Recommendation::CapacityUpgrade { recommendation, .. }
            | Recommendation::Qos { recommendation, .. } => recommendation,
        }
    }

    pub fn suggested_action(&self) -> &str {
        match self {
            Recommendation::LoadBalancing { suggested_action, .. }
            | Recommendation::CapacityUpgrade { suggested_action, .. }
            | Recommendation::Qos { suggested_action, .. } => suggested_action,
        }
    }
}

/// Result of a load analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAnalysis {
    /// One entry per link, in topology edge order
    pub link_analysis: Vec<LinkLoad>,
    pub overloaded_links: Vec<OverloadedLink>,
    pub recommendations: Vec<Recommendation>,
}

impl LoadAnalysis {
    /// Load of the link between `a` and `b`, in either order
    pub fn link(&self, a: &str, b: &str) -> Option<&LinkLoad> {
        self.link_analysis.iter().find(|load| {
            let (x, y) = &load.endpoints;
            (x == a && y == b) || (x == b && y == a)
        })
    }
}
