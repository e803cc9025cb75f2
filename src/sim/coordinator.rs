//! Simulation coordinator.
//!
//! Owns the actor registry and the shared mailbox directory, fans lifecycle
//! transitions out to every actor and aggregates their statistics. It never
//! touches an actor's tables directly.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};

use super::actor::{DeviceActor, Directory};
use super::types::*;
use crate::config::SimulationConfig;
use crate::model::DeviceStore;

/// Drives one actor per device
#[derive(Debug)]
pub struct SimulationCoordinator {
    actors: BTreeMap<String, DeviceActor>,
    directory: Directory,
    config: SimulationConfig,
    running: bool,
    paused: bool,
}

impl SimulationCoordinator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            actors: BTreeMap::new(),
            directory: Arc::new(HashMap::new()),
            config,
            running: false,
            paused: false,
        }
    }

    fn timing(&self) -> ActorTiming {
        ActorTiming {
            tick: self.config.tick,
            update_interval: self.config.update_interval,
        }
    }

    /// Create one actor per device and seed direct neighbors.
    ///
    /// Interfaces are grouped by `(network address, prefix)`; every pair of
    /// distinct devices in a group becomes mutual neighbors. Replaces any
    /// previously loaded (and stopped) actors.
    pub fn load_topology(&mut self, store: &DeviceStore) -> Result<(), SimError> {
        if self.running {
            return Err(SimError::AlreadyRunning);
        }

        let actors: BTreeMap<String, DeviceActor> = store
            .devices()
            .map(|device| (device.name.clone(), DeviceActor::new(device)))
            .collect();

        let mut groups: BTreeMap<(std::net::Ipv4Addr, u8), Vec<(&str, &str)>> = BTreeMap::new();
        for record in store.interfaces() {
            if !actors.contains_key(&record.device) {
                continue;
            }
            if let Some(key) = record.settings.network_key() {
                groups
                    .entry(key)
                    .or_default()
                    .push((record.device.as_str(), record.interface.as_str()));
            }
        }

        let mut links = 0usize;
        for ((network, prefix), members) in &groups {
            for (i, (dev_a, if_a)) in members.iter().enumerate() {
                for (dev_b, if_b) in &members[i + 1..] {
                    if dev_a == dev_b {
                        continue;
                    }
                    let network = format!("{}/{}", network, prefix);
                    if let (Some(a), Some(b)) = (actors.get(*dev_a), actors.get(*dev_b)) {
                        a.add_neighbor(
                            dev_b,
                            NeighborVia::Direct {
                                local_interface: if_a.to_string(),
                                remote_interface: if_b.to_string(),
                                network: network.clone(),
                            },
                        );
                        b.add_neighbor(
                            dev_a,
                            NeighborVia::Direct {
                                local_interface: if_b.to_string(),
                                remote_interface: if_a.to_string(),
                                network,
                            },
                        );
                        links += 1;
                    }
                }
            }
        }

        self.directory = Arc::new(
            actors
                .iter()
                .map(|(name, actor)| (name.clone(), actor.mailbox()))
                .collect(),
        );
        self.actors = actors;
        self.paused = false;

        info!(
            "Loaded {} devices into simulation with {} direct adjacencies",
            self.actors.len(),
            links
        );
        Ok(())
    }

    /// Start every actor; a warning and no-op if already running.
    ///
    /// Stopped actors cannot be restarted, so starting after `stop` fails
    /// until a topology is loaded again. If a thread fails to spawn, the
    /// actors already started are stopped before the error is returned.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.running {
            warn!("Simulation already running");
            return Ok(());
        }

        let timing = self.timing();
        let mut started = 0usize;
        let mut failure = None;
        for actor in self.actors.values_mut() {
            match actor.start(Arc::clone(&self.directory), timing) {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            error!("{}", e);
            if started > 0 {
                self.stop();
            }
            return Err(e);
        }
        if started == 0 && !self.actors.is_empty() {
            return Err(SimError::NothingToStart);
        }

        self.running = true;
        self.paused = false;
        info!("Network simulation started with {} devices", self.actors.len());
        Ok(())
    }

    pub fn pause_all(&mut self) {
        for actor in self.actors.values() {
            actor.pause();
        }
        self.paused = true;
        info!("Simulation paused");
    }

    pub fn resume_all(&mut self) {
        for actor in self.actors.values() {
            actor.resume();
        }
        self.paused = false;
        info!("Simulation resumed");
    }

    /// Stop every actor and wait for them up to the join timeout.
    ///
    /// All actors are signalled first and share one deadline. Actors that
    /// fail to exit are logged and returned; the coordinator is marked
    /// stopped regardless.
    pub fn stop(&mut self) -> Vec<SimError> {
        for actor in self.actors.values() {
            actor.signal_stop();
        }

        let deadline = Instant::now() + self.config.join_timeout;
        let mut failures = Vec::new();
        for actor in self.actors.values_mut() {
            if let Err(e) = actor.wait_for_exit(deadline) {
                error!("{}", e);
                failures.push(e);
            }
        }

        self.running = false;
        self.paused = false;
        info!("Network simulation stopped");
        failures
    }

    /// Route a fault to the named actor
    pub fn inject_fault(&self, device: &str, fault: &Fault) -> Result<(), SimError> {
        let result = match self.actors.get(device) {
            Some(actor) => actor.inject_fault(fault),
            None => Err(SimError::UnknownDevice(device.to_string())),
        };
        match &result {
            Ok(()) => info!("Injected {} into {}", fault, device),
            Err(e) => error!("Fault injection failed: {}", e),
        }
        result
    }

    /// Snapshot of every actor
    pub fn statistics(&self) -> SimulationStatistics {
        SimulationStatistics {
            simulation_running: self.running,
            simulation_paused: self.paused,
            total_devices: self.actors.len(),
            device_statistics: self
                .actors
                .iter()
                .map(|(name, actor)| (name.clone(), actor.statistics()))
                .collect(),
        }
    }

    pub fn actor(&self, device: &str) -> Option<&DeviceActor> {
        self.actors.get(device)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Drop for SimulationCoordinator {
    fn drop(&mut self) {
        if self.running {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, Interface};
    use std::thread;
    use std::time::Duration;

    fn config() -> SimulationConfig {
        SimulationConfig {
            tick: Duration::from_millis(5),
            update_interval: Duration::from_secs(3600),
            join_timeout: Duration::from_secs(5),
            ..SimulationConfig::default()
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    fn iface(name: &str, ip: &str) -> Interface {
        Interface::new(name).with_address(ip, "255.255.255.0")
    }

    fn chain() -> DeviceStore {
        DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.1.1")),
            Device::new("Switch0")
                .with_interface(iface("Vlan1", "10.0.1.2"))
                .with_interface(iface("Vlan2", "10.0.2.1")),
            Device::new("PC0").with_interface(iface("eth0", "10.0.2.10")),
            Device::new("PC1").with_interface(iface("eth0", "10.0.2.11")),
        ])
    }

    #[test]
    fn test_neighbor_seeding() {
        let mut coordinator = SimulationCoordinator::new(config());
        coordinator.load_topology(&chain()).unwrap();

        let neighbors = |device: &str| -> Vec<String> {
            coordinator
                .actor(device)
                .unwrap()
                .neighbor_table()
                .keys()
                .cloned()
                .collect()
        };
        assert_eq!(neighbors("R1"), vec!["Switch0"]);
        assert_eq!(neighbors("Switch0"), vec!["PC0", "PC1", "R1"]);
        // Shared network alone seeds neighbors, regardless of device kind
        assert_eq!(neighbors("PC0"), vec!["PC1", "Switch0"]);

        let table = coordinator.actor("R1").unwrap().neighbor_table();
        assert_eq!(
            table["Switch0"].via,
            NeighborVia::Direct {
                local_interface: "Gi0/0".to_string(),
                remote_interface: "Vlan1".to_string(),
                network: "10.0.1.0/24".to_string(),
            }
        );
    }

    #[test]
    fn test_lifecycle_and_statistics() {
        let mut coordinator = SimulationCoordinator::new(config());
        coordinator.load_topology(&chain()).unwrap();
        coordinator.start().unwrap();
        assert!(coordinator.is_running());

        // Second start is a no-op
        coordinator.start().unwrap();

        // R1 hears Switch0's ARP x2, discovery and routing update
        assert!(wait_until(|| {
            coordinator.statistics().device_statistics["R1"].stats.packets_received >= 4
        }));

        coordinator.pause_all();
        let stats = coordinator.statistics();
        assert!(stats.simulation_paused);
        assert!(stats
            .device_statistics
            .values()
            .all(|d| d.state == Lifecycle::Paused));

        coordinator.resume_all();
        assert!(!coordinator.is_paused());

        assert!(coordinator.load_topology(&chain()).is_err());

        let failures = coordinator.stop();
        assert!(failures.is_empty());

        let stats = coordinator.statistics();
        assert!(!stats.simulation_running);
        assert_eq!(stats.total_devices, 4);
        let switch = &stats.device_statistics["Switch0"];
        assert_eq!(switch.state, Lifecycle::Stopped);
        assert_eq!(switch.neighbors, 3);
        assert_eq!(switch.routing_entries, 0);
    }

    #[test]
    fn test_fault_routing() {
        let mut coordinator = SimulationCoordinator::new(config());
        coordinator.load_topology(&chain()).unwrap();
        coordinator.start().unwrap();

        let err = coordinator
            .inject_fault("Nope", &Fault::DeviceFailure)
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownDevice(_)));

        assert!(coordinator
            .inject_fault("R1", &Fault::InterfaceDown { interface: "eth0".to_string() })
            .is_err());

        coordinator.inject_fault("PC1", &Fault::DeviceFailure).unwrap();
        assert_eq!(coordinator.actor("PC1").unwrap().lifecycle(), Lifecycle::Stopped);
        assert_eq!(coordinator.actor("PC0").unwrap().lifecycle(), Lifecycle::Running);

        assert!(coordinator.stop().is_empty());
    }

    #[test]
    fn test_restart_requires_reload() {
        let mut coordinator = SimulationCoordinator::new(config());
        coordinator.load_topology(&chain()).unwrap();
        coordinator.start().unwrap();
        assert!(coordinator.stop().is_empty());

        let err = coordinator.start().unwrap_err();
        assert!(matches!(err, SimError::NothingToStart));
        assert!(!coordinator.is_running());
        assert!(!coordinator.statistics().simulation_running);

        coordinator.load_topology(&chain()).unwrap();
        coordinator.start().unwrap();
        assert!(coordinator.is_running());
        assert_eq!(coordinator.actor("R1").unwrap().lifecycle(), Lifecycle::Running);
        assert!(coordinator.stop().is_empty());
    }

    #[test]
    fn test_day_one_leaves_routing_table_empty() {
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.0.1")),
            Device::new("R2").with_interface(iface("Gi0/0", "10.0.0.2")),
        ]);
        let mut coordinator = SimulationCoordinator::new(config());
        coordinator.load_topology(&store).unwrap();
        coordinator.start().unwrap();

        // ARP learned from the peer means Day-1 has run on both sides
        assert!(wait_until(|| {
            let stats = coordinator.statistics();
            stats.device_statistics["R1"].arp_entries == 1
                && stats.device_statistics["R2"].arp_entries == 1
        }));
        assert!(coordinator.stop().is_empty());

        let stats = coordinator.statistics();
        for device in stats.device_statistics.values() {
            assert_eq!(device.routing_entries, 0);
        }
        assert!(coordinator.actor("R1").unwrap().routing_table().is_empty());
    }

    #[test]
    fn test_drop_stops_running_actors() {
        let mut coordinator = SimulationCoordinator::new(config());
        coordinator.load_topology(&chain()).unwrap();
        coordinator.start().unwrap();
        drop(coordinator);
    }
}
