use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::load::{ProfileError, TrafficProfile};
use crate::sim::ScheduledFault;

/// Run configuration; every section is optional
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Traffic profile for load estimation; the built-in default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<TrafficProfile>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.general.log_level {
            if !matches!(
                level.to_lowercase().as_str(),
                "trace" | "debug" | "info" | "warn" | "error" | "off"
            ) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "unknown log_level '{}'",
                    level
                )));
            }
        }

        if self.analysis.alternate_paths == 0 {
            return Err(ValidationError::InvalidAnalysis(
                "alternate_paths must be at least 1".to_string(),
            ));
        }
        if self.analysis.cycle_search_budget == 0 {
            return Err(ValidationError::InvalidAnalysis(
                "cycle_search_budget must be positive".to_string(),
            ));
        }

        if let Some(traffic) = &self.traffic {
            traffic.validate()?;
        }

        self.simulation.validate()
    }

    /// Traffic profile in effect
    pub fn traffic_profile(&self) -> TrafficProfile {
        self.traffic.clone().unwrap_or_default()
    }
}

/// Shared general configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Graph analysis limits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Number of loops reported by the validator
    #[serde(default = "default_max_reported_loops")]
    pub max_reported_loops: usize,
    /// Expansion steps allowed for the cycle search
    #[serde(default = "default_cycle_search_budget")]
    pub cycle_search_budget: usize,
    /// Alternate paths requested per overloaded link
    #[serde(default = "default_alternate_paths")]
    pub alternate_paths: usize,
}

fn default_max_reported_loops() -> usize {
    5
}

fn default_cycle_search_budget() -> usize {
    100_000
}

fn default_alternate_paths() -> usize {
    3
}

/// Simulation timing and scripted faults
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Sleep between actor loop iterations
    #[serde(default = "default_tick", with = "humantime_serde")]
    pub tick: Duration,
    /// Minimum spacing of routing updates
    #[serde(default = "default_update_interval", with = "humantime_serde")]
    pub update_interval: Duration,
    /// Bounded wait for an actor to exit on stop
    #[serde(default = "default_join_timeout", with = "humantime_serde")]
    pub join_timeout: Duration,
    /// Total scenario run time
    #[serde(default = "default_duration", with = "humantime_serde")]
    pub duration: Duration,
    /// How long the scenario holds the simulation paused
    #[serde(default = "default_pause_window", with = "humantime_serde")]
    pub pause_window: Duration,
    /// Faults injected after the first third of the scenario
    #[serde(default)]
    pub faults: Vec<ScheduledFault>,
}

fn default_tick() -> Duration {
    Duration::from_millis(100)
}

fn default_update_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_join_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_duration() -> Duration {
    Duration::from_secs(60)
}

fn default_pause_window() -> Duration {
    Duration::from_secs(2)
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.tick.is_zero() {
            return Err(ValidationError::InvalidSimulation(
                "tick cannot be zero".to_string(),
            ));
        }
        if self.join_timeout.is_zero() {
            return Err(ValidationError::InvalidSimulation(
                "join_timeout cannot be zero".to_string(),
            ));
        }
        if let Some(fault) = self.faults.iter().find(|f| f.device.is_empty()) {
            return Err(ValidationError::InvalidSimulation(format!(
                "fault {:?} has no target device",
                fault.fault
            )));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid analysis configuration: {0}")]
    InvalidAnalysis(String),
    #[error("Invalid traffic configuration: {0}")]
    InvalidTraffic(#[from] ProfileError),
    #[error("Invalid simulation configuration: {0}")]
    InvalidSimulation(String),
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_reported_loops: default_max_reported_loops(),
            cycle_search_budget: default_cycle_search_budget(),
            alternate_paths: default_alternate_paths(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick: default_tick(),
            update_interval: default_update_interval(),
            join_timeout: default_join_timeout(),
            duration: default_duration(),
            pause_window: default_pause_window(),
            faults: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Fault;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.simulation, SimulationConfig::default());
        assert_eq!(config.traffic_profile(), TrafficProfile::default());
    }

    #[test]
    fn test_full_config_parsing() {
        let yaml = r#"
general:
  log_level: debug
analysis:
  max_reported_loops: 3
traffic:
  base_demand: 5000
  overload_threshold: 0.5
simulation:
  tick: 20ms
  update_interval: 5s
  duration: 3s
  faults:
    - device: R1
      fault: interface_down
      interface: Gi0/0
    - device: Switch0
      fault: device_failure
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.analysis.max_reported_loops, 3);
        assert_eq!(config.analysis.cycle_search_budget, 100_000);

        let traffic = config.traffic_profile();
        assert_eq!(traffic.base_demand, 5000);
        assert_eq!(traffic.router_increment, 20_000);
        assert_eq!(traffic.overload_threshold, 0.5);

        assert_eq!(config.simulation.tick, Duration::from_millis(20));
        assert_eq!(config.simulation.update_interval, Duration::from_secs(5));
        assert_eq!(config.simulation.join_timeout, Duration::from_secs(5));
        assert_eq!(config.simulation.faults.len(), 2);
        assert_eq!(
            config.simulation.faults[0].fault,
            Fault::InterfaceDown { interface: "Gi0/0".to_string() }
        );
        assert_eq!(config.simulation.faults[1].fault, Fault::DeviceFailure);
    }

    #[test]
    fn test_validation_errors() {
        let config: Config = serde_yaml::from_str("general:\n  log_level: loud\n").unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));

        let config: Config = serde_yaml::from_str("simulation:\n  tick: 0s\n").unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSimulation(_))));

        let config: Config = serde_yaml::from_str("analysis:\n  alternate_paths: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidAnalysis(_))));

        let config: Config = serde_yaml::from_str("traffic:\n  overload_threshold: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTraffic(_))));
    }
}
