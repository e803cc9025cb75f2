//! Device simulation actor.
//!
//! Each actor owns a mailbox and a private table set and runs its loop on a
//! dedicated named thread. The handle kept by the coordinator only flips the
//! lifecycle flag, applies faults and reads snapshots.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, info, warn};

use super::message::{Message, Payload};
use super::types::*;
use crate::model::{Device, DeviceKind, Interface, InterfaceStatus, RoutingProtocol};

/// Device name to mailbox, built once before any actor starts
pub type Directory = Arc<HashMap<String, Sender<Message>>>;

/// Poll interval while waiting for an actor thread to exit
const JOIN_POLL: Duration = Duration::from_millis(5);

/// Tables and counters private to one actor
#[derive(Debug, Default)]
struct DeviceState {
    interfaces: BTreeMap<String, Interface>,
    neighbors: BTreeMap<String, NeighborEntry>,
    arp_table: BTreeMap<String, ArpEntry>,
    routing_table: RoutingTable,
    counters: Counters,
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
    initialized: bool,
    last_update: Option<Instant>,
}

fn lock(state: &Mutex<DeviceState>) -> MutexGuard<'_, DeviceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to one simulated device
#[derive(Debug)]
pub struct DeviceActor {
    name: String,
    kind: DeviceKind,
    protocols: Vec<RoutingProtocol>,
    lifecycle: Arc<LifecycleCell>,
    state: Arc<Mutex<DeviceState>>,
    mailbox: Sender<Message>,
    inbox: Receiver<Message>,
    handle: Option<JoinHandle<()>>,
}

impl DeviceActor {
    /// Create an actor in the `Created` state from a device record
    pub fn new(device: &Device) -> Self {
        let (mailbox, inbox) = channel::unbounded();
        let state = DeviceState {
            interfaces: device.interfaces.clone(),
            ..DeviceState::default()
        };
        Self {
            name: device.name.clone(),
            kind: device.kind(),
            protocols: device.routing_protocols.clone(),
            lifecycle: Arc::new(LifecycleCell::new(Lifecycle::Created)),
            state: Arc::new(Mutex::new(state)),
            mailbox,
            inbox,
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    /// Sender side of this actor's mailbox
    pub fn mailbox(&self) -> Sender<Message> {
        self.mailbox.clone()
    }

    /// Messages queued and not yet processed
    pub fn pending_messages(&self) -> usize {
        self.inbox.len()
    }

    /// Insert or replace a neighbor entry
    pub fn add_neighbor(&self, neighbor: &str, via: NeighborVia) {
        lock(&self.state).neighbors.insert(
            neighbor.to_string(),
            NeighborEntry {
                via,
                last_seen: Utc::now(),
            },
        );
    }

    /// Spawn the actor thread and enter `Running`.
    ///
    /// Returns `Ok(false)` without doing anything unless the actor is still
    /// in `Created`.
    pub fn start(&mut self, directory: Directory, timing: ActorTiming) -> Result<bool, SimError> {
        if !self.lifecycle.transition(Lifecycle::Created, Lifecycle::Running) {
            warn!("{} is {}, not starting", self.name, self.lifecycle.get());
            return Ok(false);
        }

        let worker = self.worker(directory, timing);
        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                info!("Started device actor {}", self.name);
                Ok(true)
            }
            Err(source) => {
                self.lifecycle.stop();
                Err(SimError::Spawn {
                    device: self.name.clone(),
                    source,
                })
            }
        }
    }

    fn worker(&self, directory: Directory, timing: ActorTiming) -> Worker {
        Worker {
            name: self.name.clone(),
            kind: self.kind,
            protocols: self.protocols.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
            state: Arc::clone(&self.state),
            inbox: self.inbox.clone(),
            directory,
            timing,
        }
    }

    pub fn pause(&self) {
        if self.lifecycle.transition(Lifecycle::Running, Lifecycle::Paused) {
            debug!("Paused {}", self.name);
        }
    }

    pub fn resume(&self) {
        if self.lifecycle.transition(Lifecycle::Paused, Lifecycle::Running) {
            debug!("Resumed {}", self.name);
        }
    }

    /// Set the stop flag without waiting
    pub fn signal_stop(&self) {
        let previous = self.lifecycle.stop();
        if previous != Lifecycle::Stopped {
            debug!("Stop requested for {} (was {})", self.name, previous);
        }
    }

    /// Wait until the actor thread has exited or `deadline` passes.
    ///
    /// On timeout the thread is left running and the handle is kept, so a
    /// later call may still join it.
    pub fn wait_for_exit(&mut self, deadline: Instant) -> Result<(), SimError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let started = Instant::now();
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                self.handle = Some(handle);
                return Err(SimError::JoinTimeout {
                    device: self.name.clone(),
                    waited: started.elapsed(),
                });
            }
            thread::sleep(JOIN_POLL);
        }

        handle.join().map_err(|_| SimError::ActorPanicked {
            device: self.name.clone(),
        })
    }

    /// Stop the actor and wait up to `timeout` for its thread to exit
    pub fn stop(&mut self, timeout: Duration) -> Result<(), SimError> {
        self.signal_stop();
        self.wait_for_exit(Instant::now() + timeout)
    }

    /// Apply a fault immediately, bypassing the mailbox
    pub fn inject_fault(&self, fault: &Fault) -> Result<(), SimError> {
        match fault {
            Fault::InterfaceDown { interface } => {
                let mut state = lock(&self.state);
                let Some(iface) = state.interfaces.get_mut(interface) else {
                    return Err(SimError::UnknownInterface {
                        device: self.name.clone(),
                        interface: interface.clone(),
                    });
                };
                iface.status = InterfaceStatus::Down;
                warn!("Fault injected: {} interface {} down", self.name, interface);
            }
            Fault::DeviceFailure => {
                self.lifecycle.stop();
                warn!("Fault injected: {} device failure", self.name);
            }
        }
        Ok(())
    }

    /// Snapshot of counters and table sizes
    pub fn statistics(&self) -> DeviceStatistics {
        let state = lock(&self.state);
        let uptime = match state.started_at {
            Some(started) => state
                .stopped_at
                .unwrap_or_else(Instant::now)
                .saturating_duration_since(started)
                .as_secs_f64(),
            None => 0.0,
        };

        DeviceStatistics {
            name: self.name.clone(),
            kind: self.kind,
            state: self.lifecycle.get(),
            stats: Counters {
                uptime,
                ..state.counters.clone()
            },
            neighbors: state.neighbors.len(),
            routing_entries: state.routing_table.len(),
            arp_entries: state.arp_table.len(),
            pending_messages: self.inbox.len(),
        }
    }

    pub fn neighbor_table(&self) -> BTreeMap<String, NeighborEntry> {
        lock(&self.state).neighbors.clone()
    }

    pub fn arp_table(&self) -> BTreeMap<String, ArpEntry> {
        lock(&self.state).arp_table.clone()
    }

    pub fn routing_table(&self) -> RoutingTable {
        lock(&self.state).routing_table.clone()
    }

    pub fn interface_status(&self, interface: &str) -> Option<InterfaceStatus> {
        lock(&self.state).interfaces.get(interface).map(|i| i.status)
    }
}

impl Drop for DeviceActor {
    fn drop(&mut self) {
        self.lifecycle.stop();
    }
}

/// The part of an actor that lives on its thread
struct Worker {
    name: String,
    kind: DeviceKind,
    protocols: Vec<RoutingProtocol>,
    lifecycle: Arc<LifecycleCell>,
    state: Arc<Mutex<DeviceState>>,
    inbox: Receiver<Message>,
    directory: Directory,
    timing: ActorTiming,
}

impl Worker {
    fn run(self) {
        debug!("{} actor loop started", self.name);
        loop {
            match self.lifecycle.get() {
                Lifecycle::Stopped => break,
                Lifecycle::Running => self.step(),
                Lifecycle::Created | Lifecycle::Paused => {}
            }
            thread::sleep(self.timing.tick);
        }
        lock(&self.state).stopped_at = Some(Instant::now());
        info!("Device actor {} stopped", self.name);
    }

    /// One active iteration: Day-1 init once, drain the mailbox, maybe update
    fn step(&self) {
        let initialized = lock(&self.state).initialized;
        if !initialized {
            self.initialize();
        }

        // Only what is queued now; later arrivals wait for the next tick
        let queued = self.inbox.len();
        for _ in 0..queued {
            match self.inbox.try_recv() {
                Ok(message) => self.handle(message),
                Err(_) => break,
            }
        }

        let due = lock(&self.state)
            .last_update
            .map_or(true, |last| last.elapsed() >= self.timing.update_interval);
        if due {
            self.send_routing_updates();
        }
    }

    /// Day-1 initialization: ARP, protocol hellos, discovery
    fn initialize(&self) {
        let announcements: Vec<(String, String)> = {
            let mut state = lock(&self.state);
            state.initialized = true;
            state.started_at = Some(Instant::now());

            let up: Vec<(String, String)> = state
                .interfaces
                .iter()
                .filter(|(_, iface)| iface.is_up() && iface.has_ip())
                .filter_map(|(name, iface)| iface.ip_address.clone().map(|ip| (name.clone(), ip)))
                .collect();
            up
        };

        info!("{} performing Day-1 initialization", self.name);

        for (interface, ip) in announcements {
            self.broadcast(Payload::ArpRequest { interface, ip });
        }

        for protocol in &self.protocols {
            match protocol {
                RoutingProtocol::Ospf { process_id } => self.broadcast(Payload::OspfHello {
                    process_id: process_id.clone(),
                }),
                RoutingProtocol::Bgp { as_number } => self.broadcast(Payload::BgpOpen {
                    as_number: as_number.clone(),
                }),
                RoutingProtocol::Other => {
                    debug!("{} has an unsupported routing protocol, no hello sent", self.name)
                }
            }
        }

        self.broadcast(Payload::NeighborDiscovery {
            device_type: self.kind,
        });
    }

    fn handle(&self, message: Message) {
        let mut state = lock(&self.state);
        state.counters.packets_received += 1;

        let Message {
            source,
            timestamp,
            payload,
        } = message;
        let from_self = source == self.name;

        match payload {
            Payload::ArpRequest { interface, ip } => {
                if !from_self {
                    debug!("{} learned ARP entry: {} -> {}", self.name, ip, source);
                    state.arp_table.insert(
                        ip,
                        ArpEntry {
                            device: source,
                            interface,
                            learned_at: timestamp,
                        },
                    );
                }
            }
            Payload::OspfHello { process_id } => {
                if !from_self {
                    debug!("{} established OSPF neighbor with {}", self.name, source);
                    upsert_neighbor(&mut state, source, NeighborVia::Ospf { process_id });
                }
            }
            Payload::BgpOpen { as_number } => {
                if !from_self {
                    debug!("{} established BGP neighbor with {}", self.name, source);
                    upsert_neighbor(&mut state, source, NeighborVia::Bgp { as_number });
                }
            }
            Payload::NeighborDiscovery { device_type } => {
                if !from_self {
                    debug!("{} discovered neighbor {}", self.name, source);
                    upsert_neighbor(&mut state, source, NeighborVia::General { device_type });
                }
            }
            Payload::RoutingUpdate { routing_table } => {
                debug!(
                    "{} dropped routing update from {} ({} routes)",
                    self.name,
                    source,
                    routing_table.len()
                );
            }
            Payload::Unrecognized { kind } => {
                debug!("{} received unknown message type: {}", self.name, kind);
            }
        }
    }

    fn send_routing_updates(&self) {
        let (neighbors, routing_table) = {
            let mut state = lock(&self.state);
            state.last_update = Some(Instant::now());
            let neighbors: Vec<String> = state.neighbors.keys().cloned().collect();
            (neighbors, state.routing_table.clone())
        };

        for neighbor in neighbors {
            self.send_to(
                &neighbor,
                Payload::RoutingUpdate {
                    routing_table: routing_table.clone(),
                },
            );
        }
    }

    /// Send to every current neighbor; `packets_sent` grows by the neighbor count
    fn broadcast(&self, payload: Payload) {
        let neighbors: Vec<String> = lock(&self.state).neighbors.keys().cloned().collect();

        let failures = neighbors
            .iter()
            .filter(|neighbor| !self.deliver(neighbor, Message::new(&self.name, payload.clone())))
            .count();

        let mut state = lock(&self.state);
        state.counters.packets_sent += neighbors.len() as u64;
        state.counters.errors += failures as u64;
    }

    /// Point-to-point send; `packets_sent` grows by one
    fn send_to(&self, neighbor: &str, payload: Payload) {
        let delivered = self.deliver(neighbor, Message::new(&self.name, payload));

        let mut state = lock(&self.state);
        state.counters.packets_sent += 1;
        if !delivered {
            state.counters.errors += 1;
        }
    }

    /// Fire-and-forget delivery into the target mailbox
    fn deliver(&self, target: &str, message: Message) -> bool {
        debug!("{} -> {}: {}", self.name, target, message.kind());
        match self.directory.get(target) {
            Some(mailbox) => mailbox.send(message).is_ok(),
            None => {
                warn!("{} cannot reach {}: no such mailbox", self.name, target);
                false
            }
        }
    }
}

fn upsert_neighbor(state: &mut DeviceState, neighbor: String, via: NeighborVia) {
    state.neighbors.insert(
        neighbor,
        NeighborEntry {
            via,
            last_seen: Utc::now(),
        },
    );
}
