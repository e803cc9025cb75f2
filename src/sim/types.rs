//! Simulation data types: lifecycle, faults, runtime tables and statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::DeviceKind;

/// Actor lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Created,
    Running,
    Paused,
    Stopped,
}

impl Lifecycle {
    fn to_u8(self) -> u8 {
        match self {
            Lifecycle::Created => 0,
            Lifecycle::Running => 1,
            Lifecycle::Paused => 2,
            Lifecycle::Stopped => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Lifecycle::Created,
            1 => Lifecycle::Running,
            2 => Lifecycle::Paused,
            _ => Lifecycle::Stopped,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifecycle::Created => "created",
            Lifecycle::Running => "running",
            Lifecycle::Paused => "paused",
            Lifecycle::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Lifecycle state shared between an actor handle and its thread
#[derive(Debug)]
pub struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    pub fn new(state: Lifecycle) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    pub fn get(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `from` to `to`; false if the state was something else
    pub fn transition(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.0
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Enter `Stopped` from any state; returns the previous state
    pub fn stop(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.swap(Lifecycle::Stopped.to_u8(), Ordering::AcqRel))
    }
}

/// Out-of-band fault applied synchronously to an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum Fault {
    /// Mark one interface administratively down
    InterfaceDown { interface: String },
    /// Stop the actor immediately
    DeviceFailure,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::InterfaceDown { interface } => write!(f, "interface_down({})", interface),
            Fault::DeviceFailure => write!(f, "device_failure"),
        }
    }
}

/// A fault aimed at a device, as configured or given on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledFault {
    pub device: String,
    #[serde(flatten)]
    pub fault: Fault,
}

impl FromStr for ScheduledFault {
    type Err = SimError;

    /// Parse `DEVICE:KIND[:INTERFACE]`, e.g. `R1:interface_down:Gi0/0`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SimError::InvalidFault(s.to_string());

        let mut parts = s.splitn(3, ':');
        let device = parts.next().filter(|d| !d.is_empty()).ok_or_else(invalid)?;
        let kind = parts.next().ok_or_else(invalid)?;
        let fault = match (kind, parts.next()) {
            ("interface_down", Some(interface)) if !interface.is_empty() => Fault::InterfaceDown {
                interface: interface.to_string(),
            },
            ("device_failure", None) => Fault::DeviceFailure,
            _ => return Err(invalid()),
        };

        Ok(Self {
            device: device.to_string(),
            fault,
        })
    }
}

/// How a neighbor became known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NeighborVia {
    /// Seeded from a shared IP network before start
    Direct {
        local_interface: String,
        remote_interface: String,
        network: String,
    },
    Ospf { process_id: String },
    Bgp { as_number: Option<String> },
    /// Learned from a neighbor discovery announcement
    General { device_type: DeviceKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborEntry {
    #[serde(flatten)]
    pub via: NeighborVia,
    pub last_seen: DateTime<Utc>,
}

/// ARP table entry, keyed by IP in the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub device: String,
    pub interface: String,
    pub learned_at: DateTime<Utc>,
}

/// Destination prefix to next hop.
///
/// Day-1 simulation runs no route computation, so the table stays empty and
/// routing updates carry it as-is.
pub type RoutingTable = BTreeMap<String, String>;

/// Per-actor message counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub errors: u64,
    /// Seconds since the actor started running
    pub uptime: f64,
}

/// Snapshot of one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatistics {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub state: Lifecycle,
    pub stats: Counters,
    pub neighbors: usize,
    pub routing_entries: usize,
    pub arp_entries: usize,
    /// Messages queued in the mailbox and not yet processed
    pub pending_messages: usize,
}

/// Snapshot of the whole simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatistics {
    pub simulation_running: bool,
    pub simulation_paused: bool,
    pub total_devices: usize,
    pub device_statistics: BTreeMap<String, DeviceStatistics>,
}

/// Actor timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorTiming {
    /// Sleep between loop iterations
    pub tick: Duration,
    /// Minimum spacing of routing updates
    pub update_interval: Duration,
}

impl Default for ActorTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            update_interval: Duration::from_secs(30),
        }
    }
}

/// Simulation errors
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("device {device} has no interface {interface}")]
    UnknownInterface { device: String, interface: String },
    #[error("invalid fault '{0}', expected DEVICE:interface_down:INTERFACE or DEVICE:device_failure")]
    InvalidFault(String),
    #[error("cannot load a topology while the simulation is running")]
    AlreadyRunning,
    #[error("no device actor can be started; load the topology again")]
    NothingToStart,
    #[error("actor {device} did not exit after {waited:?}")]
    JoinTimeout { device: String, waited: Duration },
    #[error("actor {device} panicked")]
    ActorPanicked { device: String },
    #[error("failed to spawn actor thread for {device}")]
    Spawn {
        device: String,
        #[source]
        source: std::io::Error,
    },
}
