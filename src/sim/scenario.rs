//! Scripted simulation run.
//!
//! The run is split into thirds: faults go in after the first, the whole
//! network is paused for `pause_window` after the second, and statistics are
//! collected once everything has stopped.

use std::thread;

use log::{info, warn};

use super::coordinator::SimulationCoordinator;
use super::types::{SimError, SimulationStatistics};
use crate::config::SimulationConfig;
use crate::model::DeviceStore;

/// Run the scripted scenario and return final statistics.
///
/// Fault injection failures are logged and do not end the run.
pub fn run_scenario(
    store: &DeviceStore,
    config: &SimulationConfig,
) -> Result<SimulationStatistics, SimError> {
    let mut coordinator = SimulationCoordinator::new(config.clone());
    coordinator.load_topology(store)?;

    info!("Starting simulation for {:?}", config.duration);
    coordinator.start()?;

    let third = config.duration / 3;
    thread::sleep(third);

    for scheduled in &config.faults {
        if let Err(e) = coordinator.inject_fault(&scheduled.device, &scheduled.fault) {
            warn!("Skipping fault {} on {}: {}", scheduled.fault, scheduled.device, e);
        }
    }

    thread::sleep(third);

    info!("Pausing simulation for {:?}", config.pause_window);
    coordinator.pause_all();
    thread::sleep(config.pause_window);
    coordinator.resume_all();

    thread::sleep(third);

    let failures = coordinator.stop();
    if !failures.is_empty() {
        warn!("{} actors did not stop in time", failures.len());
    }
    Ok(coordinator.statistics())
}
