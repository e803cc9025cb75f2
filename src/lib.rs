//! # netmapsim - Network topology reconstruction, validation and simulation
//!
//! This library turns parsed network device configurations into an analyzable
//! model of the network and a concurrent simulation of its control plane.
//!
//! ## Overview
//!
//! The input is the structured record set produced by a configuration-dump
//! parser: devices with their interfaces, routing protocols and VLANs. From it
//! the library infers which devices share an IP network, builds a device
//! graph, checks the configuration for common mistakes, estimates link load
//! and can run one simulated device per thread exchanging protocol messages.
//!
//! ## Key Features
//!
//! - **Topology reconstruction**: adjacency from shared IPv4 networks filtered
//!   by device-kind rules, hierarchy tiers from degree centrality
//! - **Validation**: duplicate IPs, MTU mismatches, VLAN naming, gateways,
//!   loops, protocol sizing and aggregation hints
//! - **Load estimation**: heuristic link demand, overload detection, ECMP,
//!   capacity and QoS recommendations
//! - **Simulation**: actor-per-device with mailboxes, Day-1 announcements,
//!   pause/resume/stop and fault injection
//!
//! ## Architecture
//!
//! - `model`: device records and the read-only device store
//! - `topology`: graph construction and graph queries
//! - `validation`: the check battery
//! - `load`: link load estimation
//! - `sim`: device actors, coordinator and the scripted scenario
//! - `config`, `config_loader`: run configuration and input loading
//! - `report`: JSON output and console summaries
//! - `utils`: IPv4 helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netmapsim::config::AnalysisConfig;
//! use netmapsim::config_loader::load_records;
//! use netmapsim::topology::Topology;
//! use netmapsim::validation::validate_network;
//!
//! let store = load_records("parsed_config.json".as_ref())?;
//! let topology = Topology::build(&store);
//! let report = validate_network(&store, &topology, &AnalysisConfig::default());
//! println!("{} issues, {} warnings", report.total_issues, report.total_warnings);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Malformed input never fails an analysis: records that cannot be used are
//! skipped and listed (`Topology::anomalies`, `ValidationReport::skipped_checks`).
//! Typed errors are returned only for operational failures such as an unknown
//! device in fault injection; the binary reports them through `color_eyre`.

pub mod config;
pub mod config_loader;
pub mod load;
pub mod model;
pub mod report;
pub mod sim;
pub mod topology;
pub mod utils;
pub mod validation;
