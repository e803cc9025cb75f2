//! Report output.
//!
//! Writes the analysis results as pretty JSON for downstream tools and
//! prints short human-readable summaries.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use crate::load::LoadAnalysis;
use crate::sim::SimulationStatistics;
use crate::topology::NetworkInfo;
use crate::validation::{Finding, ValidationReport};

pub const NETWORK_INFO_FILE: &str = "network_info.json";
pub const VALIDATION_FILE: &str = "validation_results.json";
pub const LOAD_ANALYSIS_FILE: &str = "load_analysis.json";
pub const SIMULATION_STATS_FILE: &str = "simulation_stats.json";

/// Serialize `value` as pretty JSON into `output_path`
pub fn write_json_report<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

pub fn print_network_info(info: &NetworkInfo) {
    println!("\n=== NETWORK TOPOLOGY ===");
    println!("Devices: {}", info.nodes);
    println!("Links: {}", info.edges);
    println!("Density: {:.3}", info.density);
    println!("Connected: {}", if info.is_connected { "yes" } else { "no" });
    match info.diameter {
        Some(diameter) => println!("Diameter: {}", diameter),
        None => println!("Diameter: n/a (disconnected)"),
    }
    println!("Core: {}", info.hierarchy.core.join(", "));
    println!("Distribution: {}", info.hierarchy.distribution.join(", "));
    println!("Access: {}", info.hierarchy.access.join(", "));
}

fn print_finding(marker: &str, finding: &Finding) {
    println!(
        "{} {}: {}",
        marker,
        finding.severity.to_string().to_uppercase(),
        finding.description
    );
    println!("   Recommendation: {}\n", finding.recommendation);
}

pub fn print_validation_summary(report: &ValidationReport) {
    println!("\n=== VALIDATION SUMMARY ===");
    println!(
        "{} issues, {} warnings\n",
        report.total_issues, report.total_warnings
    );
    for issue in &report.issues {
        print_finding("[ISSUE]", issue);
    }
    for warning in &report.warnings {
        print_finding("[WARN]", warning);
    }
    for skipped in &report.skipped_checks {
        println!("[SKIPPED] {}: {}", skipped.name, skipped.reason);
    }
}

pub fn print_load_summary(analysis: &LoadAnalysis) {
    println!("\n=== LOAD BALANCING RECOMMENDATIONS ===");
    println!(
        "{} of {} links overloaded\n",
        analysis.overloaded_links.len(),
        analysis.link_analysis.len()
    );
    for rec in &analysis.recommendations {
        println!("{}: {}", rec.kind().to_uppercase(), rec.recommendation());
        println!("   Action: {}\n", rec.suggested_action());
    }
}

pub fn print_simulation_summary(stats: &SimulationStatistics) {
    println!("\n=== SIMULATION SUMMARY ===");
    for (device, device_stats) in &stats.device_statistics {
        println!(
            "{}: {} sent, {} received, {} errors, {} neighbors ({})",
            device,
            device_stats.stats.packets_sent,
            device_stats.stats.packets_received,
            device_stats.stats.errors,
            device_stats.neighbors,
            device_stats.state
        );
    }
}
