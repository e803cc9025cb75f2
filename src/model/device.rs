//! Device and interface records.
//!
//! These types mirror the structured output of the configuration-dump
//! parser. They are created once at load time and only read afterwards;
//! simulation state lives in separate runtime records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::ip_utils;

/// Bandwidth substituted when an interface has none configured (or zero)
pub const DEFAULT_BANDWIDTH: u64 = 100_000;

/// MTU assumed when an interface has none configured
pub const DEFAULT_MTU: u32 = 1500;

/// Inferred device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Router,
    Switch,
    Pc,
    Server,
    Laptop,
    #[serde(other)]
    Unknown,
}

impl DeviceKind {
    /// Infer a kind from a device name.
    ///
    /// Short names starting with `r` (R1, R12) are routers; `switch*`/`sw*`
    /// are switches; `pc*`, `server*` and `laptop*` are end hosts.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.starts_with('r') && name.chars().count() <= 3 {
            DeviceKind::Router
        } else if lower.starts_with("switch") || lower.starts_with("sw") {
            DeviceKind::Switch
        } else if lower.starts_with("pc") {
            DeviceKind::Pc
        } else if lower.starts_with("server") {
            DeviceKind::Server
        } else if lower.starts_with("laptop") {
            DeviceKind::Laptop
        } else {
            DeviceKind::Unknown
        }
    }

    /// Returns true for devices that terminate traffic rather than forward it
    pub fn is_end_host(&self) -> bool {
        matches!(
            self,
            DeviceKind::Pc | DeviceKind::Server | DeviceKind::Laptop | DeviceKind::Unknown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Router => "router",
            DeviceKind::Switch => "switch",
            DeviceKind::Pc => "pc",
            DeviceKind::Server => "server",
            DeviceKind::Laptop => "laptop",
            DeviceKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrative state of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceStatus {
    #[default]
    Up,
    Down,
}

/// A single configured interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub subnet_mask: Option<String>,
    /// Configured bandwidth, if any
    #[serde(default)]
    pub bandwidth: Option<u64>,
    #[serde(default = "default_mtu")]
    pub mtu: u32,
    #[serde(default)]
    pub vlan: Option<u16>,
    #[serde(default)]
    pub status: InterfaceStatus,
}

fn default_mtu() -> u32 {
    DEFAULT_MTU
}

impl Interface {
    /// Create an unaddressed interface with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip_address: None,
            subnet_mask: None,
            bandwidth: None,
            mtu: DEFAULT_MTU,
            vlan: None,
            status: InterfaceStatus::Up,
        }
    }

    /// Builder-style helper assigning an address and mask
    pub fn with_address(mut self, ip: &str, mask: &str) -> Self {
        self.ip_address = Some(ip.to_string());
        self.subnet_mask = Some(mask.to_string());
        self
    }

    /// Returns true if the interface has an IP address assigned
    pub fn has_ip(&self) -> bool {
        self.ip_address.as_deref().is_some_and(|ip| !ip.trim().is_empty())
    }

    pub fn is_up(&self) -> bool {
        self.status == InterfaceStatus::Up
    }

    /// Bandwidth used for link cost: unset or zero becomes the default
    pub fn effective_bandwidth(&self) -> u64 {
        match self.bandwidth {
            Some(bw) if bw > 0 => bw,
            _ => DEFAULT_BANDWIDTH,
        }
    }

    /// `(network address, prefix length)` when both address and mask parse
    pub fn network_key(&self) -> Option<(std::net::Ipv4Addr, u8)> {
        ip_utils::network_key(self.ip_address.as_deref()?, self.subnet_mask.as_deref()?)
    }
}

/// Routing protocol process configured on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum RoutingProtocol {
    Ospf {
        #[serde(default = "default_process_id", deserialize_with = "string_or_number")]
        process_id: String,
    },
    Bgp {
        #[serde(default, deserialize_with = "optional_string_or_number")]
        as_number: Option<String>,
    },
    #[serde(other)]
    Other,
}

fn default_process_id() -> String {
    "1".to_string()
}

impl RoutingProtocol {
    pub fn is_bgp(&self) -> bool {
        matches!(self, RoutingProtocol::Bgp { .. })
    }

    pub fn is_ospf(&self) -> bool {
        matches!(self, RoutingProtocol::Ospf { .. })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
        }
    }
}

/// Parsers emit process ids and AS numbers as strings, hand-written records
/// often use numbers; accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

/// VLAN declared on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: u16,
    pub name: String,
}

/// A parsed network device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub name: String,
    /// Type as declared by the parser; `None` or `unknown` defers to the name
    #[serde(rename = "type", alias = "kind", default, skip_serializing_if = "Option::is_none")]
    pub declared_kind: Option<DeviceKind>,
    #[serde(default)]
    pub interfaces: BTreeMap<String, Interface>,
    #[serde(default)]
    pub routing_protocols: Vec<RoutingProtocol>,
    #[serde(default)]
    pub vlans: BTreeMap<u16, Vlan>,
    #[serde(default)]
    pub hostname: Option<String>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_kind: None,
            interfaces: BTreeMap::new(),
            routing_protocols: Vec::new(),
            vlans: BTreeMap::new(),
            hostname: None,
        }
    }

    /// Builder-style helper to force an explicit kind
    pub fn with_kind(mut self, kind: DeviceKind) -> Self {
        self.declared_kind = Some(kind);
        self
    }

    /// Builder-style helper adding an interface keyed by its name
    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interfaces.insert(interface.name.clone(), interface);
        self
    }

    pub fn with_protocol(mut self, protocol: RoutingProtocol) -> Self {
        self.routing_protocols.push(protocol);
        self
    }

    pub fn with_vlan(mut self, id: u16, name: &str) -> Self {
        self.vlans.insert(id, Vlan { id, name: name.to_string() });
        self
    }

    /// Effective kind: an explicit type wins unless it is `unknown`
    pub fn kind(&self) -> DeviceKind {
        match self.declared_kind {
            Some(kind) if kind != DeviceKind::Unknown => kind,
            _ => DeviceKind::from_name(&self.name),
        }
    }

    pub fn runs_bgp(&self) -> bool {
        self.routing_protocols.iter().any(RoutingProtocol::is_bgp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_inference() {
        assert_eq!(DeviceKind::from_name("R1"), DeviceKind::Router);
        assert_eq!(DeviceKind::from_name("r12"), DeviceKind::Router);
        assert_eq!(DeviceKind::from_name("Router1"), DeviceKind::Unknown);
        assert_eq!(DeviceKind::from_name("Switch0"), DeviceKind::Switch);
        assert_eq!(DeviceKind::from_name("SW3"), DeviceKind::Switch);
        assert_eq!(DeviceKind::from_name("PC0"), DeviceKind::Pc);
        assert_eq!(DeviceKind::from_name("Server1"), DeviceKind::Server);
        assert_eq!(DeviceKind::from_name("laptop7"), DeviceKind::Laptop);
        assert_eq!(DeviceKind::from_name("printer"), DeviceKind::Unknown);
    }

    #[test]
    fn test_declared_kind_overrides_name() {
        let device = Device::new("edge-gw").with_kind(DeviceKind::Router);
        assert_eq!(device.kind(), DeviceKind::Router);

        let device = Device::new("R1").with_kind(DeviceKind::Unknown);
        assert_eq!(device.kind(), DeviceKind::Router);
    }

    #[test]
    fn test_effective_bandwidth() {
        let mut iface = Interface::new("Gi0/0");
        assert_eq!(iface.effective_bandwidth(), DEFAULT_BANDWIDTH);
        iface.bandwidth = Some(0);
        assert_eq!(iface.effective_bandwidth(), DEFAULT_BANDWIDTH);
        iface.bandwidth = Some(1544);
        assert_eq!(iface.effective_bandwidth(), 1544);
    }

    #[test]
    fn test_device_deserialization() {
        let json = r#"{
            "name": "R1",
            "type": "router",
            "interfaces": {
                "Gi0/0": {"name": "Gi0/0", "ip_address": "10.0.0.1", "subnet_mask": "255.255.255.0"}
            },
            "routing_protocols": [
                {"protocol": "ospf", "process_id": "10"},
                {"protocol": "bgp", "as_number": 65001},
                {"protocol": "eigrp"}
            ],
            "vlans": {"10": {"id": 10, "name": "USERS"}},
            "hostname": "R1"
        }"#;

        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.kind(), DeviceKind::Router);
        let iface = &device.interfaces["Gi0/0"];
        assert_eq!(iface.mtu, DEFAULT_MTU);
        assert_eq!(iface.status, InterfaceStatus::Up);
        assert_eq!(
            device.routing_protocols,
            vec![
                RoutingProtocol::Ospf { process_id: "10".to_string() },
                RoutingProtocol::Bgp { as_number: Some("65001".to_string()) },
                RoutingProtocol::Other,
            ]
        );
        assert!(device.runs_bgp());
        assert_eq!(device.vlans[&10].name, "USERS");
    }
}
