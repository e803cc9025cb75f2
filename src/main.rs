//! netmapsim - network topology analysis and device simulation
//!
//! Loads parsed device records, reconstructs the topology and runs the
//! requested analysis or simulation, writing JSON results to the output
//! directory.
//!
//! Usage:
//!   netmapsim --input parsed_config.json analyze
//!   netmapsim --input parsed_config.json simulate --duration 30 --fault R1:interface_down:Gi0/0

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use env_logger::Env;
use log::info;

use netmapsim::config::Config;
use netmapsim::config_loader::{load_config_or_default, load_records};
use netmapsim::load::analyze_traffic_load;
use netmapsim::model::DeviceStore;
use netmapsim::report::{self, LOAD_ANALYSIS_FILE, NETWORK_INFO_FILE, SIMULATION_STATS_FILE, VALIDATION_FILE};
use netmapsim::sim::{run_scenario, ScheduledFault};
use netmapsim::topology::Topology;
use netmapsim::validation::validate_network;

#[derive(Parser)]
#[command(name = "netmapsim")]
#[command(about = "Reconstruct, validate and simulate networks from parsed device configurations")]
#[command(version)]
struct Cli {
    /// Parsed device records (.json, otherwise YAML)
    #[arg(short, long)]
    input: PathBuf,

    /// Run configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for result files
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Number of threads for the validator (0 = auto)
    #[arg(long, default_value = "0")]
    threads: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the topology and report its summary
    Info,

    /// Run the validation checks
    Validate,

    /// Estimate link load and recommend balancing
    Load,

    /// Topology summary, validation and load analysis
    Analyze,

    /// Run the device simulation scenario
    Simulate {
        /// Scenario duration in seconds; overrides the config file
        #[arg(long)]
        duration: Option<u64>,

        /// Fault to inject after the first third, DEVICE:KIND[:INTERFACE]
        #[arg(long = "fault")]
        faults: Vec<ScheduledFault>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = load_config_or_default(cli.config.as_deref())?;

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(&log_level)).init();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let store = load_records(&cli.input)
        .with_context(|| format!("Failed to load device records from {}", cli.input.display()))?;
    if store.is_empty() {
        color_eyre::eyre::bail!("No devices found in {}", cli.input.display());
    }

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create output directory: {}", cli.output.display()))?;

    match cli.command {
        Commands::Info => {
            let topology = Topology::build(&store);
            run_info(&topology, &cli.output)?;
        }
        Commands::Validate => {
            let topology = Topology::build(&store);
            run_validate(&store, &topology, &config, &cli.output)?;
        }
        Commands::Load => {
            let topology = Topology::build(&store);
            run_load(&topology, &config, &cli.output)?;
        }
        Commands::Analyze => {
            let topology = Topology::build(&store);
            run_info(&topology, &cli.output)?;
            run_validate(&store, &topology, &config, &cli.output)?;
            run_load(&topology, &config, &cli.output)?;
        }
        Commands::Simulate { duration, faults } => {
            run_simulate(&store, config, duration, faults, &cli.output)?;
        }
    }

    println!("\nResults saved to: {}", cli.output.display());
    info!("Done");
    Ok(())
}

fn run_info(topology: &Topology, output: &Path) -> Result<()> {
    let network_info = topology.network_info();
    report::write_json_report(&network_info, &output.join(NETWORK_INFO_FILE))?;
    report::print_network_info(&network_info);
    Ok(())
}

fn run_validate(store: &DeviceStore, topology: &Topology, config: &Config, output: &Path) -> Result<()> {
    let results = validate_network(store, topology, &config.analysis);
    report::write_json_report(&results, &output.join(VALIDATION_FILE))?;
    report::print_validation_summary(&results);
    Ok(())
}

fn run_load(topology: &Topology, config: &Config, output: &Path) -> Result<()> {
    let profile = config.traffic_profile();
    let analysis = analyze_traffic_load(topology, Some(&profile), config.analysis.alternate_paths);
    report::write_json_report(&analysis, &output.join(LOAD_ANALYSIS_FILE))?;
    report::print_load_summary(&analysis);
    Ok(())
}

fn run_simulate(
    store: &DeviceStore,
    config: Config,
    duration: Option<u64>,
    faults: Vec<ScheduledFault>,
    output: &Path,
) -> Result<()> {
    let mut sim_config = config.simulation;
    if let Some(secs) = duration {
        sim_config.duration = Duration::from_secs(secs);
    }
    sim_config.faults.extend(faults);

    println!("Starting simulation for {:?}...", sim_config.duration);
    let stats = run_scenario(store, &sim_config).context("Simulation failed")?;

    report::write_json_report(&stats, &output.join(SIMULATION_STATS_FILE))?;
    report::print_simulation_summary(&stats);
    Ok(())
}
