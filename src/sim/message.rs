//! Messages exchanged between device actors.

use chrono::{DateTime, Utc};

use super::types::RoutingTable;
use crate::model::DeviceKind;

/// A message delivered to an actor's mailbox
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Sending device
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Payload,
}

impl Message {
    pub fn new(source: impl Into<String>, payload: Payload) -> Self {
        Self {
            source: source.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Wire name of the message kind
    pub fn kind(&self) -> &str {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Announces the sender's address on one interface
    ArpRequest { interface: String, ip: String },
    OspfHello { process_id: String },
    BgpOpen { as_number: Option<String> },
    NeighborDiscovery { device_type: DeviceKind },
    RoutingUpdate { routing_table: RoutingTable },
    /// Any kind this simulator does not model; logged and dropped on receipt
    Unrecognized { kind: String },
}

impl Payload {
    pub fn kind(&self) -> &str {
        match self {
            Payload::ArpRequest { .. } => "arp_request",
            Payload::OspfHello { .. } => "ospf_hello",
            Payload::BgpOpen { .. } => "bgp_open",
            Payload::NeighborDiscovery { .. } => "neighbor_discovery",
            Payload::RoutingUpdate { .. } => "routing_update",
            Payload::Unrecognized { kind } => kind,
        }
    }
}
