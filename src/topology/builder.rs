//! Topology Graph Engine.
//!
//! Reconstructs an undirected device graph from interface addressing, then
//! classifies the hierarchy and precomputes hop-count shortest paths.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};

use super::adjacency::may_connect;
use super::cycles::{simple_cycles, CycleSearch};
use super::paths::{bfs_paths, k_shortest_simple_paths};
use super::types::{DeviceNode, Hierarchy, Link, LinkEnd, NetworkInfo};
use crate::model::{DeviceKind, DeviceStore, InterfaceRecord};
use crate::utils::ip_utils::{is_same_network, is_valid_ipv4};

/// Share of ranked devices placed in the core tier
const CORE_FRACTION: f64 = 0.2;
/// Cumulative share of ranked devices in core plus distribution
const DISTRIBUTION_FRACTION: f64 = 0.6;

/// The reconstructed network
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: UnGraph<DeviceNode, Link>,
    index: HashMap<String, NodeIndex>,
    hierarchy: Hierarchy,
    shortest_paths: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    anomalies: Vec<String>,
}

impl Topology {
    /// Build the topology from a device store.
    ///
    /// One node per device; an edge for every pair of addressed interfaces on
    /// different devices that share an IPv4 network under the first
    /// interface's mask and whose device kinds may connect. A later qualifying
    /// pair between the same two devices overwrites the earlier link.
    pub fn build(store: &DeviceStore) -> Self {
        info!("Building network topology...");

        let mut topology = Topology::default();
        for device in store.devices() {
            let ix = topology.graph.add_node(DeviceNode {
                name: device.name.clone(),
                kind: device.kind(),
            });
            topology.index.insert(device.name.clone(), ix);
        }

        let mut interfaces: Vec<&InterfaceRecord> = Vec::new();
        for record in store.interfaces().filter(|record| record.settings.has_ip()) {
            let ip = record.settings.ip_address.as_deref().unwrap_or_default();
            if !topology.index.contains_key(&record.device) {
                topology.anomalies.push(format!(
                    "interface {} references unknown device {}",
                    record.interface, record.device
                ));
            } else if !is_valid_ipv4(ip) {
                topology.anomalies.push(format!(
                    "interface {} on {} has unparseable address '{}'",
                    record.interface, record.device, ip
                ));
            } else {
                interfaces.push(record);
            }
        }

        for (i, first) in interfaces.iter().enumerate() {
            for second in &interfaces[i + 1..] {
                topology.connect_if_adjacent(first, second);
            }
        }

        for anomaly in &topology.anomalies {
            warn!("Skipped during topology build: {}", anomaly);
        }

        topology.hierarchy = topology.compute_hierarchy();
        topology.shortest_paths = topology.compute_shortest_paths();

        info!(
            "Topology built: {} nodes, {} edges",
            topology.graph.node_count(),
            topology.graph.edge_count()
        );
        topology
    }

    fn connect_if_adjacent(&mut self, first: &InterfaceRecord, second: &InterfaceRecord) {
        if first.device == second.device {
            return;
        }
        let (Some(ip1), Some(ip2)) = (
            first.settings.ip_address.as_deref(),
            second.settings.ip_address.as_deref(),
        ) else {
            return;
        };
        // The first interface's mask decides for both sides
        let Some(mask) = first.settings.subnet_mask.as_deref() else {
            return;
        };
        if !is_same_network(ip1, ip2, mask) {
            return;
        }

        let (Some(&a), Some(&b)) = (self.index.get(&first.device), self.index.get(&second.device)) else {
            return;
        };
        if !may_connect(self.graph[a].kind, self.graph[b].kind) {
            debug!(
                "Not linking {} ({}) and {} ({}): kinds may not connect",
                first.device, self.graph[a].kind, second.device, self.graph[b].kind
            );
            return;
        }

        let bandwidth = first
            .settings
            .effective_bandwidth()
            .min(second.settings.effective_bandwidth());
        let link = Link {
            a: LinkEnd {
                device: first.device.clone(),
                interface: first.interface.clone(),
                mtu: first.settings.mtu,
            },
            b: LinkEnd {
                device: second.device.clone(),
                interface: second.interface.clone(),
                mtu: second.settings.mtu,
            },
            bandwidth,
            weight: 1.0 / bandwidth as f64,
        };
        self.graph.update_edge(a, b, link);
        info!("Connected {} to {} (BW: {})", first.device, second.device, bandwidth);
    }

    /// Degree centrality per device: degree / (N - 1), or 0 for N <= 1
    pub fn degree_centrality(&self) -> Vec<(String, f64)> {
        let n = self.graph.node_count();
        self.graph
            .node_indices()
            .map(|ix| {
                let centrality = if n > 1 {
                    self.graph.neighbors(ix).count() as f64 / (n - 1) as f64
                } else {
                    0.0
                };
                (self.graph[ix].name.clone(), centrality)
            })
            .collect()
    }

    /// Partition devices into core / distribution / access by centrality rank.
    ///
    /// Ranking is a stable descending sort, so equal centralities keep device
    /// order. Rank `i` of `N` is core while `i < 0.2 N`, distribution while
    /// `i < 0.6 N`, access otherwise.
    pub fn compute_hierarchy(&self) -> Hierarchy {
        let mut ranked = self.degree_centrality();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let total = ranked.len() as f64;
        let mut hierarchy = Hierarchy::default();
        for (i, (device, _)) in ranked.into_iter().enumerate() {
            let rank = i as f64;
            if rank < total * CORE_FRACTION {
                hierarchy.core.push(device);
            } else if rank < total * DISTRIBUTION_FRACTION {
                hierarchy.distribution.push(device);
            } else {
                hierarchy.access.push(device);
            }
        }

        info!(
            "Hierarchy - Core: {:?}, Distribution: {:?}, Access: {:?}",
            hierarchy.core, hierarchy.distribution, hierarchy.access
        );
        hierarchy
    }

    fn compute_shortest_paths(&self) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
        let mut table = BTreeMap::new();
        for source in self.graph.node_indices() {
            let paths = bfs_paths(&self.graph, source)
                .into_iter()
                .map(|(target, path)| (self.graph[target].name.clone(), self.names(&path)))
                .collect();
            table.insert(self.graph[source].name.clone(), paths);
        }
        debug!("Shortest paths calculated for {} sources", table.len());
        table
    }

    fn names(&self, path: &[NodeIndex]) -> Vec<String> {
        path.iter().map(|ix| self.graph[*ix].name.clone()).collect()
    }

    /// Precomputed hop-count shortest path, if `target` is reachable
    pub fn shortest_path(&self, source: &str, target: &str) -> Option<&[String]> {
        self.shortest_paths
            .get(source)
            .and_then(|paths| paths.get(target))
            .map(Vec::as_slice)
    }

    /// All precomputed shortest paths, keyed by source then target
    pub fn shortest_paths(&self) -> &BTreeMap<String, BTreeMap<String, Vec<String>>> {
        &self.shortest_paths
    }

    /// Up to `k` simple paths between two devices, shortest first.
    ///
    /// Unknown devices or unreachable targets give an empty result.
    pub fn alternate_paths(&self, source: &str, target: &str, k: usize) -> Vec<Vec<String>> {
        let (Some(&a), Some(&b)) = (self.index.get(source), self.index.get(target)) else {
            return Vec::new();
        };
        k_shortest_simple_paths(&self.graph, a, b, k)
            .iter()
            .map(|path| self.names(path))
            .collect()
    }

    /// Simple cycles of the directed closure, as device-name sequences
    pub fn loops(&self, limit: usize, step_budget: usize) -> (Vec<Vec<String>>, bool) {
        let CycleSearch { cycles, budget_exhausted } = simple_cycles(&self.graph, limit, step_budget);
        if budget_exhausted {
            warn!(
                "Cycle search stopped after {} steps with {} cycles found",
                step_budget,
                cycles.len()
            );
        }
        (cycles.iter().map(|c| self.names(c)).collect(), budget_exhausted)
    }

    /// Summary metrics of the graph
    pub fn network_info(&self) -> NetworkInfo {
        let nodes = self.graph.node_count();
        let edges = self.graph.edge_count();
        let density = if nodes > 1 {
            2.0 * edges as f64 / (nodes * (nodes - 1)) as f64
        } else {
            0.0
        };
        let is_connected = self.is_connected();
        let diameter = is_connected.then(|| {
            self.shortest_paths
                .values()
                .flat_map(|paths| paths.values())
                .map(|path| path.len().saturating_sub(1))
                .max()
                .unwrap_or(0)
        });

        NetworkInfo {
            nodes,
            edges,
            hierarchy: self.hierarchy.clone(),
            density,
            is_connected,
            diameter,
        }
    }

    /// A graph is connected when it is non-empty and forms one component
    pub fn is_connected(&self) -> bool {
        self.graph.node_count() > 0 && connected_components(&self.graph) == 1
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Input records skipped while building
    pub fn anomalies(&self) -> &[String] {
        &self.anomalies
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, device: &str) -> bool {
        self.index.contains_key(device)
    }

    /// All links in edge order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.graph.edge_weights()
    }

    /// The link between two devices, if any
    pub fn link(&self, a: &str, b: &str) -> Option<&Link> {
        let (&ia, &ib) = (self.index.get(a)?, self.index.get(b)?);
        self.graph.find_edge(ia, ib).map(|edge| &self.graph[edge])
    }

    /// Neighboring device names in graph order
    pub fn neighbors(&self, device: &str) -> Vec<&DeviceNode> {
        match self.index.get(device) {
            Some(&ix) => self.graph.neighbors(ix).map(|n| &self.graph[n]).collect(),
            None => Vec::new(),
        }
    }

    /// Kind of a device in the graph
    pub fn kind_of(&self, device: &str) -> Option<DeviceKind> {
        self.index.get(device).map(|&ix| self.graph[ix].kind)
    }

    /// Devices in insertion (name) order
    pub fn nodes(&self) -> impl Iterator<Item = &DeviceNode> {
        self.graph.node_indices().map(|ix| &self.graph[ix])
    }
}
