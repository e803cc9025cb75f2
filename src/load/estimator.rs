//! Link load estimation.
//!
//! Demand per link comes from a fixed heuristic over the endpoint kinds and
//! names, not from a flow model. The numbers are placeholders meant to
//! exercise the recommendation logic.

use log::info;

use super::types::*;
use crate::model::DeviceKind;
use crate::topology::{Link, Topology};

/// Priority guidance attached to the QoS recommendation
const QOS_PRIORITY_CLASSES: [&str; 3] = [
    "High: Database and critical applications",
    "Medium: Web traffic and user applications",
    "Low: Backup and maintenance traffic",
];

/// Utilization of a link; zero bandwidth counts as unused
pub fn utilization(demand: u64, bandwidth: u64) -> f64 {
    if bandwidth == 0 {
        0.0
    } else {
        demand as f64 / bandwidth as f64
    }
}

/// Classify a link against an overload threshold
pub fn classify(demand: u64, bandwidth: u64, threshold: f64) -> LinkStatus {
    if utilization(demand, bandwidth) > threshold {
        LinkStatus::Overloaded
    } else {
        LinkStatus::Normal
    }
}

/// Estimate the demand carried by a link
pub fn estimate_link_demand(topology: &Topology, link: &Link, profile: &TrafficProfile) -> u64 {
    let mut demand = profile.base_demand;

    let router_involved = [&link.a.device, &link.b.device]
        .iter()
        .any(|device| topology.kind_of(device) == Some(DeviceKind::Router));
    if router_involved {
        demand += profile.router_increment;
    }

    let core_involved = [&link.a.device, &link.b.device]
        .iter()
        .any(|device| device.to_lowercase().contains("core"));
    if core_involved {
        demand += profile.core_increment;
    }

    demand
}

/// Analyze link loads and produce load balancing recommendations.
///
/// `profile` falls back to [`TrafficProfile::default`] when `None`.
/// `alternate_paths` is how many paths to request per overloaded link.
pub fn analyze_traffic_load(
    topology: &Topology,
    profile: Option<&TrafficProfile>,
    alternate_paths: usize,
) -> LoadAnalysis {
    info!("Analyzing traffic load...");

    let default_profile;
    let profile = match profile {
        Some(profile) => profile,
        None => {
            default_profile = TrafficProfile::default();
            &default_profile
        }
    };

    let mut link_analysis = Vec::new();
    let mut overloaded_links = Vec::new();

    for link in topology.links() {
        let demand = estimate_link_demand(topology, link, profile);
        let utilization = utilization(demand, link.bandwidth);
        let status = classify(demand, link.bandwidth, profile.overload_threshold);

        if status == LinkStatus::Overloaded {
            overloaded_links.push(OverloadedLink {
                link: link.id(),
                endpoints: (link.a.device.clone(), link.b.device.clone()),
                utilization,
                bandwidth: link.bandwidth,
                demand,
            });
        }

        link_analysis.push(LinkLoad {
            link: link.id(),
            endpoints: (link.a.device.clone(), link.b.device.clone()),
            bandwidth: link.bandwidth,
            demand,
            utilization,
            status,
        });
    }

    let recommendations = recommend(topology, &overloaded_links, profile, alternate_paths);

    info!(
        "Found {} overloaded links out of {}",
        overloaded_links.len(),
        link_analysis.len()
    );

    LoadAnalysis {
        link_analysis,
        overloaded_links,
        recommendations,
    }
}

fn recommend(
    topology: &Topology,
    overloaded_links: &[OverloadedLink],
    profile: &TrafficProfile,
    alternate_paths: usize,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for overloaded in overloaded_links {
        let (a, b) = &overloaded.endpoints;
        let paths = topology.alternate_paths(a, b, alternate_paths);

        if paths.len() > 1 {
            recommendations.push(Recommendation::LoadBalancing {
                overloaded_link: overloaded.link.clone(),
                utilization: overloaded.utilization,
                recommendation: "Distribute traffic across alternative paths".to_string(),
                alternative_paths: paths[1..].to_vec(),
                suggested_action: "Implement ECMP (Equal Cost Multi-Path) routing".to_string(),
            });
        } else {
            recommendations.push(Recommendation::CapacityUpgrade {
                overloaded_link: overloaded.link.clone(),
                utilization: overloaded.utilization,
                recommendation: "Upgrade link capacity".to_string(),
                current_bandwidth: overloaded.bandwidth,
                suggested_bandwidth: (overloaded.demand as f64 * profile.upgrade_factor) as u64,
                suggested_action: "Increase link bandwidth or add parallel links".to_string(),
            });
        }
    }

    if !overloaded_links.is_empty() {
        recommendations.push(Recommendation::Qos {
            recommendation: "Implement Quality of Service (QoS) policies".to_string(),
            suggested_action: "Prioritize critical traffic and limit non-essential traffic"
                .to_string(),
            priority_classes: QOS_PRIORITY_CLASSES.iter().map(|c| c.to_string()).collect(),
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, DeviceStore, Interface};

    fn iface(name: &str, ip: &str, bandwidth: Option<u64>) -> Interface {
        let mut iface = Interface::new(name).with_address(ip, "255.255.255.0");
        iface.bandwidth = bandwidth;
        iface
    }

    #[test]
    fn test_classification_threshold() {
        assert_eq!(classify(9000, 10_000, 0.8), LinkStatus::Overloaded);
        assert_eq!(classify(5000, 10_000, 0.8), LinkStatus::Normal);
        assert_eq!(classify(8000, 10_000, 0.8), LinkStatus::Normal);
        assert!((utilization(9000, 10_000) - 0.9).abs() < 1e-12);
        assert_eq!(utilization(9000, 0), 0.0);
        assert_eq!(classify(9000, 0, 0.8), LinkStatus::Normal);
    }

    #[test]
    fn test_demand_heuristic() {
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.0.1", None)),
            Device::new("Switch0").with_interface(iface("Vlan1", "10.0.0.2", None)),
            Device::new("core-sw")
                .with_kind(DeviceKind::Switch)
                .with_interface(iface("Gi0/0", "10.0.1.2", None)),
            Device::new("PC0").with_interface(iface("eth0", "10.0.1.10", None)),
        ]);
        let topology = Topology::build(&store);
        let profile = TrafficProfile::default();

        let router_link = topology.link("R1", "Switch0").unwrap();
        assert_eq!(estimate_link_demand(&topology, router_link, &profile), 30_000);

        let core_link = topology.link("core-sw", "PC0").unwrap();
        assert_eq!(estimate_link_demand(&topology, core_link, &profile), 40_000);
    }

    #[test]
    fn test_overloaded_link_without_alternative_gets_upgrade() {
        // R1-R2 at 10000 carries 30000: overloaded with no other path
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Se0/0", "10.0.0.1", Some(10_000))),
            Device::new("R2").with_interface(iface("Se0/0", "10.0.0.2", Some(10_000))),
        ]);
        let topology = Topology::build(&store);
        let analysis = analyze_traffic_load(&topology, None, 3);

        let load = analysis.link("R1", "R2").unwrap();
        assert_eq!(load.status, LinkStatus::Overloaded);
        assert_eq!(load.demand, 30_000);
        assert_eq!(analysis.overloaded_links.len(), 1);

        assert_eq!(analysis.recommendations.len(), 2);
        match &analysis.recommendations[0] {
            Recommendation::CapacityUpgrade { suggested_bandwidth, current_bandwidth, .. } => {
                assert_eq!(*suggested_bandwidth, 45_000);
                assert_eq!(*current_bandwidth, 10_000);
            }
            other => panic!("expected capacity upgrade, got {:?}", other),
        }
        assert_eq!(analysis.recommendations[1].kind(), "qos");
    }

    #[test]
    fn test_overloaded_link_in_ring_gets_ecmp() {
        let store = DeviceStore::from_devices(vec![
            Device::new("R1")
                .with_interface(iface("Gi0/0", "10.0.12.1", Some(10_000)))
                .with_interface(iface("Gi0/1", "10.0.13.1", None)),
            Device::new("R2")
                .with_interface(iface("Gi0/0", "10.0.12.2", Some(10_000)))
                .with_interface(iface("Gi0/1", "10.0.23.2", None)),
            Device::new("R3")
                .with_interface(iface("Gi0/0", "10.0.13.3", None))
                .with_interface(iface("Gi0/1", "10.0.23.3", None)),
        ]);
        let topology = Topology::build(&store);
        let analysis = analyze_traffic_load(&topology, None, 3);

        assert_eq!(analysis.overloaded_links.len(), 1);
        match &analysis.recommendations[0] {
            Recommendation::LoadBalancing { overloaded_link, alternative_paths, .. } => {
                assert_eq!(overloaded_link, "R1-R2");
                assert_eq!(
                    alternative_paths,
                    &vec![vec!["R1".to_string(), "R3".to_string(), "R2".to_string()]]
                );
            }
            other => panic!("expected load balancing, got {:?}", other),
        }
    }

    #[test]
    fn test_no_overload_means_no_recommendations() {
        let store = DeviceStore::from_devices(vec![
            Device::new("R1").with_interface(iface("Gi0/0", "10.0.0.1", None)),
            Device::new("R2").with_interface(iface("Gi0/0", "10.0.0.2", None)),
        ]);
        let analysis = analyze_traffic_load(&Topology::build(&store), None, 3);
        assert!(analysis.overloaded_links.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert!((analysis.link("R2", "R1").unwrap().utilization - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_recommendation_serializes_with_type_tag() {
        let rec = Recommendation::Qos {
            recommendation: "r".to_string(),
            suggested_action: "a".to_string(),
            priority_classes: vec![],
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "qos");
    }

    #[test]
    fn test_hyphenated_names_keep_separate_links() {
        // Both links would render as "X-Y-Z"
        let router = |name: &str, ip: &str| {
            Device::new(name)
                .with_kind(DeviceKind::Router)
                .with_interface(iface("Gi0/0", ip, None))
        };
        let store = DeviceStore::from_devices(vec![
            router("X-Y", "10.0.1.1"),
            router("Z", "10.0.1.2"),
            router("X", "10.0.2.1"),
            router("Y-Z", "10.0.2.2"),
        ]);
        let topology = Topology::build(&store);
        assert_eq!(topology.edge_count(), 2);

        let analysis = analyze_traffic_load(&topology, None, 3);
        assert_eq!(analysis.link_analysis.len(), 2);

        let first = analysis.link("X-Y", "Z").unwrap();
        let second = analysis.link("X", "Y-Z").unwrap();
        assert_eq!(first.link, second.link);
        assert_ne!(first.endpoints, second.endpoints);
        assert!(analysis.link("X", "Z").is_none());
    }

    #[test]
    fn test_profile_validation_errors() {
        let profile = TrafficProfile {
            overload_threshold: 0.0,
            ..TrafficProfile::default()
        };
        assert_eq!(profile.validate(), Err(ProfileError::OverloadThreshold(0.0)));

        let profile = TrafficProfile {
            upgrade_factor: 0.5,
            ..TrafficProfile::default()
        };
        assert_eq!(profile.validate(), Err(ProfileError::UpgradeFactor(0.5)));
        assert!(TrafficProfile::default().validate().is_ok());
    }
}
