//! Validation checks.
//!
//! Every check is a plain function over a shared read-only context that
//! returns its own findings. The runner executes them in parallel and merges
//! the results in the fixed order of [`CHECKS`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info, warn};
use rayon::prelude::*;

use super::types::*;
use crate::config::AnalysisConfig;
use crate::model::{DeviceKind, DeviceStore};
use crate::topology::Topology;
use crate::utils::ip_utils::is_gateway_style;

/// Everything a check may look at
pub struct ValidationContext<'a> {
    pub store: &'a DeviceStore,
    pub topology: &'a Topology,
    pub analysis: &'a AnalysisConfig,
}

/// Signature shared by all checks
pub type CheckFn = fn(&ValidationContext<'_>) -> Result<Findings, CheckError>;

/// The check battery, in report order
pub const CHECKS: &[(&str, CheckFn)] = &[
    ("duplicate_ips", check_duplicate_ips),
    ("mtu_consistency", check_mtu_consistency),
    ("missing_components", check_missing_components),
    ("vlan_consistency", check_vlan_consistency),
    ("gateway_configuration", check_gateway_configuration),
    ("network_loops", check_network_loops),
    ("routing_protocols", check_routing_protocols),
    ("node_aggregation", check_node_aggregation),
];

/// Run the full check battery against a store and its topology
pub fn validate_network(
    store: &DeviceStore,
    topology: &Topology,
    analysis: &AnalysisConfig,
) -> ValidationReport {
    info!("Validating network configuration...");
    let ctx = ValidationContext {
        store,
        topology,
        analysis,
    };
    let report = run_checks(&ctx, CHECKS);
    info!(
        "Validation complete: {} issues, {} warnings",
        report.total_issues, report.total_warnings
    );
    report
}

/// Run `checks` in parallel; a failing check is recorded and skipped
pub fn run_checks(ctx: &ValidationContext<'_>, checks: &[(&str, CheckFn)]) -> ValidationReport {
    let outcomes: Vec<(&str, Result<Findings, CheckError>)> = checks
        .par_iter()
        .map(|(name, check)| (*name, check(ctx)))
        .collect();

    let mut report = ValidationReport::default();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(findings) => {
                debug!(
                    "Check {}: {} issues, {} warnings",
                    name,
                    findings.issues.len(),
                    findings.warnings.len()
                );
                report.merge(findings);
            }
            Err(e) => {
                warn!("Check {} failed and was skipped: {}", name, e);
                report.skipped_checks.push(SkippedCheck {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}

/// Interfaces sharing an IP within a VLAN across different devices
pub fn check_duplicate_ips(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    // (ip, vlan) -> distinct owners in first-seen order
    let mut order: Vec<(String, String)> = Vec::new();
    let mut owners: HashMap<(String, String), Vec<String>> = HashMap::new();

    for record in ctx.store.interfaces().filter(|r| r.settings.has_ip()) {
        let ip = record.settings.ip_address.clone().unwrap_or_default();
        let vlan = record
            .settings
            .vlan
            .map(|id| id.to_string())
            .unwrap_or_else(|| "default".to_string());
        let key = (ip, vlan);

        let devices = owners.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if !devices.contains(&record.device) {
            devices.push(record.device.clone());
        }
    }

    let mut findings = Findings::default();
    for key in order {
        let devices = &owners[&key];
        if devices.len() > 1 {
            let (ip, vlan) = key;
            findings.issue(
                Finding::new(
                    FindingKind::DuplicateIp,
                    Severity::High,
                    format!("Duplicate IP {} in VLAN {}", ip, vlan),
                    "Assign unique IP addresses to each interface",
                )
                .with_devices(devices.clone()),
            );
        }
    }
    Ok(findings)
}

/// Links whose endpoints disagree on MTU
pub fn check_mtu_consistency(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    let mut findings = Findings::default();
    for link in ctx.topology.links().filter(|link| link.has_mtu_mismatch()) {
        findings.warning(
            Finding::new(
                FindingKind::MtuMismatch,
                Severity::Medium,
                format!(
                    "MTU mismatch between {} ({}) and {} ({})",
                    link.a.device, link.a.mtu, link.b.device, link.b.mtu
                ),
                format!(
                    "Set consistent MTU value (recommend {})",
                    link.a.mtu.max(link.b.mtu)
                ),
            )
            .with_devices(vec![link.a.device.clone(), link.b.device.clone()]),
        );
    }
    Ok(findings)
}

pub fn check_missing_components(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    let kinds: BTreeSet<DeviceKind> = ctx.store.devices().map(|d| d.kind()).collect();

    let mut findings = Findings::default();
    if !kinds.contains(&DeviceKind::Router) {
        findings.warning(Finding::new(
            FindingKind::MissingComponent,
            Severity::Medium,
            "No routers found in configuration",
            "Ensure router configurations are included",
        ));
    }
    if !kinds.contains(&DeviceKind::Switch) {
        findings.warning(Finding::new(
            FindingKind::MissingComponent,
            Severity::Low,
            "No switches found in configuration",
            "Consider adding switch configurations for complete topology",
        ));
    }
    Ok(findings)
}

/// VLAN ids declared under more than one name
pub fn check_vlan_consistency(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    let mut names: BTreeMap<u16, BTreeSet<&str>> = BTreeMap::new();
    let mut declared_by: BTreeMap<u16, Vec<String>> = BTreeMap::new();
    for device in ctx.store.devices() {
        for (id, vlan) in &device.vlans {
            names.entry(*id).or_default().insert(vlan.name.as_str());
            declared_by.entry(*id).or_default().push(device.name.clone());
        }
    }

    let mut findings = Findings::default();
    for (id, vlan_names) in names.iter().filter(|(_, n)| n.len() > 1) {
        let listed: Vec<&str> = vlan_names.iter().copied().collect();
        findings.issue(
            Finding::new(
                FindingKind::VlanInconsistency,
                Severity::Medium,
                format!("VLAN {} has inconsistent names: {:?}", id, listed),
                format!("Use consistent name for VLAN {}", id),
            )
            .with_devices(declared_by.remove(id).unwrap_or_default()),
        );
    }
    Ok(findings)
}

/// Routers with no interface addressed as `x.x.x.1`
pub fn check_gateway_configuration(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    let mut findings = Findings::default();
    for router in ctx.store.devices().filter(|d| d.kind() == DeviceKind::Router) {
        let has_gateway = router
            .interfaces
            .values()
            .filter_map(|iface| iface.ip_address.as_deref())
            .any(is_gateway_style);
        if !has_gateway {
            findings.warning(
                Finding::new(
                    FindingKind::GatewayConfig,
                    Severity::Low,
                    format!("Router {} may not have gateway interface configured", router.name),
                    "Verify gateway configuration on router interfaces",
                )
                .with_devices(vec![router.name.clone()]),
            );
        }
    }
    Ok(findings)
}

pub fn check_network_loops(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    let budget = ctx.analysis.cycle_search_budget;
    let (loops, exhausted) = ctx.topology.loops(ctx.analysis.max_reported_loops, budget);
    if exhausted && loops.is_empty() {
        return Err(CheckError::SearchBudgetExhausted { steps: budget });
    }

    let mut findings = Findings::default();
    for cycle in loops {
        findings.warning(
            Finding::new(
                FindingKind::NetworkLoop,
                Severity::Medium,
                format!("Potential network loop detected: {}", cycle.join(" -> ")),
                "Implement STP or remove redundant connections",
            )
            .with_devices(cycle),
        );
    }
    Ok(findings)
}

/// BGP against network size
pub fn check_routing_protocols(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    let device_count = ctx.store.device_count();
    let bgp_devices: Vec<String> = ctx
        .store
        .devices()
        .filter(|d| d.runs_bgp())
        .map(|d| d.name.clone())
        .collect();

    let mut findings = Findings::default();
    if device_count > 10 && bgp_devices.is_empty() {
        findings.warning(Finding::new(
            FindingKind::ProtocolOptimization,
            Severity::Low,
            "Large network detected without BGP",
            "Consider implementing BGP for better scalability",
        ));
    }
    if device_count <= 5 && !bgp_devices.is_empty() {
        findings.warning(
            Finding::new(
                FindingKind::ProtocolOptimization,
                Severity::Low,
                "BGP may be overkill for small network",
                "OSPF might be more appropriate for this network size",
            )
            .with_devices(bgp_devices),
        );
    }
    Ok(findings)
}

/// Leaf switches hanging off another switch
pub fn check_node_aggregation(ctx: &ValidationContext<'_>) -> Result<Findings, CheckError> {
    let kind_of = |name: &str| {
        ctx.store
            .kind_of(name)
            .ok_or_else(|| CheckError::MissingDevice(name.to_string()))
    };

    let mut findings = Findings::default();
    for node in ctx.topology.nodes() {
        if kind_of(&node.name)? != DeviceKind::Switch {
            continue;
        }
        let neighbors = ctx.topology.neighbors(&node.name);
        let [neighbor] = neighbors.as_slice() else {
            continue;
        };
        if kind_of(&neighbor.name)? == DeviceKind::Switch {
            findings.warning(
                Finding::new(
                    FindingKind::NodeAggregation,
                    Severity::Low,
                    format!("Switches {} and {} could be aggregated", node.name, neighbor.name),
                    format!(
                        "Consider combining {} and {} into single switch",
                        node.name, neighbor.name
                    ),
                )
                .with_devices(vec![node.name.clone(), neighbor.name.clone()]),
            );
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, Interface, RoutingProtocol};

    const MASK: &str = "255.255.255.0";

    fn iface(name: &str, ip: &str) -> Interface {
        Interface::new(name).with_address(ip, MASK)
    }

    fn vlan_iface(name: &str, ip: &str, vlan: u16) -> Interface {
        let mut iface = iface(name, ip);
        iface.vlan = Some(vlan);
        iface
    }

    fn run(store: &DeviceStore, check: CheckFn) -> Findings {
        let topology = Topology::build(store);
        let analysis = AnalysisConfig::default();
        let ctx = ValidationContext {
            store,
            topology: &topology,
            analysis: &analysis,
        };
        check(&ctx).unwrap()
    }

    #[test]
    fn test_duplicate_ip_same_vlan() {
        let store = DeviceStore::from_devices(vec![
            Device::new("PC0").with_interface(vlan_iface("eth0", "10.0.0.5", 10)),
            Device::new("PC1").with_interface(vlan_iface("eth0", "10.0.0.5", 10)),
        ]);
        let findings = run(&store, check_duplicate_ips);

        assert_eq!(findings.issues.len(), 1);
        let issue = &findings.issues[0];
        assert_eq!(issue.kind, FindingKind::DuplicateIp);
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.description, "Duplicate IP 10.0.0.5 in VLAN 10");
        assert_eq!(issue.affected_devices, vec!["PC0".to_string(), "PC1".to_string()]);
    }

    #[test]
    fn test_duplicate_ip_different_vlans_is_fine() {
        let store = DeviceStore::from_devices(vec![
            Device::new("PC0").with_interface(vlan_iface("eth0", "10.0.0.5", 10)),
            Device::new("PC1").with_interface(vlan_iface("eth0", "10.0.0.5", 20)),
        ]);
        assert!(run(&store, check_duplicate_ips).is_empty());
    }

    #[test]
    fn test_duplicate_ip_on_one_device_is_not_reported() {
        let store = DeviceStore::from_devices(vec![Device::new("R1")
            .with_interface(iface("Gi0/0", "10.0.0.1"))
            .with_interface(iface("Gi0/1", "10.0.0.1"))]);
        assert!(run(&store, check_duplicate_ips).is_empty());
    }

    #[test]
    fn test_duplicate_ip_default_vlan() {
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.0.1")),
            Device::new("R2").with_interface(iface("Gi0/0", "10.0.0.1")),
            Device::new("R3").with_interface(iface("Gi0/0", "10.0.0.1")),
        ]);
        let findings = run(&store, check_duplicate_ips);
        assert_eq!(findings.issues.len(), 1);
        assert_eq!(findings.issues[0].description, "Duplicate IP 10.0.0.1 in VLAN default");
        assert_eq!(findings.issues[0].affected_devices.len(), 3);
    }

    #[test]
    fn test_mtu_mismatch_recommends_larger() {
        let mut small = iface("Gi0/0", "10.0.0.2");
        small.mtu = 1400;
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.0.1")),
            Device::new("R2").with_interface(small),
        ]);
        let findings = run(&store, check_mtu_consistency);

        assert_eq!(findings.warnings.len(), 1);
        let warning = &findings.warnings[0];
        assert_eq!(warning.severity, Severity::Medium);
        assert_eq!(warning.description, "MTU mismatch between R1 (1500) and R2 (1400)");
        assert_eq!(warning.recommendation, "Set consistent MTU value (recommend 1500)");
    }

    #[test]
    fn test_missing_components() {
        let store = DeviceStore::from_devices(vec![Device::new("PC0")]);
        let findings = run(&store, check_missing_components);
        assert_eq!(findings.warnings.len(), 2);
        assert_eq!(findings.warnings[0].severity, Severity::Medium);
        assert_eq!(findings.warnings[1].severity, Severity::Low);

        let store = DeviceStore::from_devices(vec![Device::new("R1"), Device::new("Switch0")]);
        assert!(run(&store, check_missing_components).is_empty());
    }

    #[test]
    fn test_vlan_inconsistency() {
        let store = DeviceStore::from_devices(vec![
            Device::new("Switch0").with_vlan(10, "Sales").with_vlan(20, "Eng"),
            Device::new("Switch1").with_vlan(10, "Marketing").with_vlan(20, "Eng"),
        ]);
        let findings = run(&store, check_vlan_consistency);

        assert_eq!(findings.issues.len(), 1);
        let issue = &findings.issues[0];
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(
            issue.description,
            r#"VLAN 10 has inconsistent names: ["Marketing", "Sales"]"#
        );
        assert_eq!(issue.affected_devices, vec!["Switch0".to_string(), "Switch1".to_string()]);
    }

    #[test]
    fn test_gateway_heuristic() {
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.0.1")),
            Device::new("R2").with_interface(iface("Gi0/0", "10.0.0.2")),
            Device::new("R3"),
        ]);
        let findings = run(&store, check_gateway_configuration);
        let flagged: Vec<&str> = findings
            .warnings
            .iter()
            .map(|w| w.affected_devices[0].as_str())
            .collect();
        assert_eq!(flagged, vec!["R2", "R3"]);
    }

    #[test]
    fn test_loops_capped_by_config() {
        // Router triangle: three 2-cycles plus the triangle in both directions
        let store = DeviceStore::from_devices(vec![
            Device::new("R1")
                .with_interface(iface("Gi0/0", "10.0.12.1"))
                .with_interface(iface("Gi0/1", "10.0.13.1")),
            Device::new("R2")
                .with_interface(iface("Gi0/0", "10.0.12.2"))
                .with_interface(iface("Gi0/1", "10.0.23.2")),
            Device::new("R3")
                .with_interface(iface("Gi0/0", "10.0.13.3"))
                .with_interface(iface("Gi0/1", "10.0.23.3")),
        ]);
        let topology = Topology::build(&store);

        let analysis = AnalysisConfig::default();
        let ctx = ValidationContext {
            store: &store,
            topology: &topology,
            analysis: &analysis,
        };
        let findings = check_network_loops(&ctx).unwrap();
        assert_eq!(findings.warnings.len(), 5);
        assert!(findings.warnings[0]
            .description
            .starts_with("Potential network loop detected: R1 -> "));

        let analysis = AnalysisConfig {
            max_reported_loops: 2,
            ..AnalysisConfig::default()
        };
        let ctx = ValidationContext {
            store: &store,
            topology: &topology,
            analysis: &analysis,
        };
        assert_eq!(check_network_loops(&ctx).unwrap().warnings.len(), 2);
    }

    #[test]
    fn test_loop_budget_exhaustion_is_a_check_error() {
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.0.1")),
            Device::new("R2").with_interface(iface("Gi0/0", "10.0.0.2")),
        ]);
        let topology = Topology::build(&store);
        let analysis = AnalysisConfig {
            cycle_search_budget: 1,
            ..AnalysisConfig::default()
        };
        let ctx = ValidationContext {
            store: &store,
            topology: &topology,
            analysis: &analysis,
        };
        assert!(matches!(
            check_network_loops(&ctx),
            Err(CheckError::SearchBudgetExhausted { steps: 1 })
        ));
    }

    #[test]
    fn test_protocol_sizing() {
        let small = DeviceStore::from_devices(vec![
            Device::new("R1").with_protocol(RoutingProtocol::Bgp {
                as_number: Some("65000".to_string()),
            }),
            Device::new("R2"),
        ]);
        let findings = run(&small, check_routing_protocols);
        assert_eq!(findings.warnings.len(), 1);
        assert_eq!(findings.warnings[0].description, "BGP may be overkill for small network");

        let large = DeviceStore::from_devices((0..11).map(|i| Device::new(format!("PC{}", i))));
        let findings = run(&large, check_routing_protocols);
        assert_eq!(findings.warnings.len(), 1);
        assert_eq!(findings.warnings[0].description, "Large network detected without BGP");
    }

    #[test]
    fn test_aggregation_rejects_inconsistent_inputs() {
        let store = DeviceStore::from_devices(vec![Device::new("Switch0")]);
        let topology = Topology::build(&store);
        let analysis = AnalysisConfig::default();
        let empty = DeviceStore::default();
        let ctx = ValidationContext {
            store: &empty,
            topology: &topology,
            analysis: &analysis,
        };
        assert!(matches!(
            check_node_aggregation(&ctx),
            Err(CheckError::MissingDevice(name)) if name == "Switch0"
        ));
    }

    fn always_fails(_: &ValidationContext<'_>) -> Result<Findings, CheckError> {
        Err(CheckError::MissingDevice("ghost".to_string()))
    }

    #[test]
    fn test_failing_check_is_skipped_not_fatal() {
        let store = DeviceStore::from_devices(vec![
            Device::new("PC0").with_interface(iface("eth0", "10.0.0.5")),
            Device::new("PC1").with_interface(iface("eth0", "10.0.0.5")),
        ]);
        let topology = Topology::build(&store);
        let analysis = AnalysisConfig::default();
        let ctx = ValidationContext {
            store: &store,
            topology: &topology,
            analysis: &analysis,
        };

        let checks: &[(&str, CheckFn)] = &[
            ("broken", always_fails),
            ("duplicate_ips", check_duplicate_ips),
            ("missing_components", check_missing_components),
        ];
        let report = run_checks(&ctx, checks);

        assert_eq!(report.skipped_checks.len(), 1);
        assert_eq!(report.skipped_checks[0].name, "broken");
        assert_eq!(report.total_issues, 1);
        assert_eq!(report.total_warnings, 2);
    }

    #[test]
    fn test_report_json_shape() {
        let store = DeviceStore::from_devices(vec![Device::new("PC0")]);
        let topology = Topology::build(&store);
        let report = validate_network(&store, &topology, &AnalysisConfig::default());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["total_warnings"], 2);
        assert_eq!(json["warnings"][0]["type"], "missing_component");
        assert_eq!(json["warnings"][0]["severity"], "medium");
        assert!(json["warnings"][0].get("affected_devices").is_none());
        assert!(json.get("skipped_checks").is_none());
    }
}
