//! Topology type definitions.
//!
//! Node and edge weights for the device graph, plus the hierarchy and
//! summary structures reported to callers.

use serde::{Deserialize, Serialize};

use crate::model::DeviceKind;

/// Node weight: one per device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceNode {
    pub name: String,
    pub kind: DeviceKind,
}

/// One side of a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEnd {
    pub device: String,
    pub interface: String,
    pub mtu: u32,
}

/// Edge weight: the attributes of the interface pair that formed the link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub a: LinkEnd,
    pub b: LinkEnd,
    /// Minimum of the two endpoint bandwidths
    pub bandwidth: u64,
    /// Routing weight, `1 / bandwidth`
    pub weight: f64,
}

impl Link {
    /// Link identifier in `"<a>-<b>"` form
    pub fn id(&self) -> String {
        format!("{}-{}", self.a.device, self.b.device)
    }

    pub fn has_mtu_mismatch(&self) -> bool {
        self.a.mtu != self.b.mtu
    }
}

/// Hierarchy tier of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Core,
    Distribution,
    Access,
}

/// Exhaustive, disjoint partition of the graph's devices into tiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub core: Vec<String>,
    pub distribution: Vec<String>,
    pub access: Vec<String>,
}

impl Hierarchy {
    /// Tier of a device, if it is part of the graph
    pub fn tier_of(&self, device: &str) -> Option<Tier> {
        if self.core.iter().any(|d| d == device) {
            Some(Tier::Core)
        } else if self.distribution.iter().any(|d| d == device) {
            Some(Tier::Distribution)
        } else if self.access.iter().any(|d| d == device) {
            Some(Tier::Access)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.core.len() + self.distribution.len() + self.access.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary of the built topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub nodes: usize,
    pub edges: usize,
    pub hierarchy: Hierarchy,
    pub density: f64,
    pub is_connected: bool,
    /// Longest shortest-path hop count; `None` when the graph is disconnected
    pub diameter: Option<usize>,
}
