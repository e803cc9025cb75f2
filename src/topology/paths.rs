//! Path queries over the device graph.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// Breadth-first hop-count shortest paths from `source` to every reachable node.
///
/// Each path starts at `source` and ends at the keyed node. Neighbors are
/// visited in graph order, so ties resolve the same way on every run.
pub fn bfs_paths<N, E>(graph: &UnGraph<N, E>, source: NodeIndex) -> HashMap<NodeIndex, Vec<NodeIndex>> {
    let mut parents: HashMap<NodeIndex, Option<NodeIndex>> = HashMap::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();

    parents.insert(source, None);
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        order.push(node);
        let mut neighbors: Vec<NodeIndex> = graph.neighbors(node).collect();
        neighbors.sort();
        for next in neighbors {
            if !parents.contains_key(&next) {
                parents.insert(next, Some(node));
                queue.push_back(next);
            }
        }
    }

    let mut paths: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::with_capacity(order.len());
    for node in order {
        let path = match parents.get(&node).copied().flatten() {
            Some(parent) => {
                // BFS order guarantees the parent's path is already built
                let mut path = paths.get(&parent).cloned().unwrap_or_default();
                path.push(node);
                path
            }
            None => vec![node],
        };
        paths.insert(node, path);
    }
    paths
}

/// Hop-count shortest path that avoids `blocked_nodes` and `blocked_edges`
fn bfs_path_avoiding<N, E>(
    graph: &UnGraph<N, E>,
    source: NodeIndex,
    target: NodeIndex,
    blocked_nodes: &HashSet<NodeIndex>,
    blocked_edges: &HashSet<EdgeIndex>,
) -> Option<Vec<NodeIndex>> {
    let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([source]);
    parents.insert(source, source);

    while let Some(node) = queue.pop_front() {
        if node == target {
            let mut path = vec![target];
            let mut current = target;
            while current != source {
                current = parents[&current];
                path.push(current);
            }
            path.reverse();
            return Some(path);
        }

        let mut next_hops: Vec<NodeIndex> = graph
            .edges(node)
            .filter(|edge| !blocked_edges.contains(&edge.id()))
            .map(|edge| if edge.source() == node { edge.target() } else { edge.source() })
            .filter(|next| !blocked_nodes.contains(next))
            .collect();
        next_hops.sort();
        for next in next_hops {
            if !parents.contains_key(&next) {
                parents.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

/// Up to `k` simple paths from `source` to `target`, shortest first.
///
/// Yen's algorithm: each new path deviates from an accepted one at a spur
/// node, with the spur found by BFS after removing the root prefix and the
/// edges already taken from it. Paths of equal length keep discovery order.
/// No path yields an empty result.
pub fn k_shortest_simple_paths<N, E>(
    graph: &UnGraph<N, E>,
    source: NodeIndex,
    target: NodeIndex,
    k: usize,
) -> Vec<Vec<NodeIndex>> {
    if k == 0 {
        return Vec::new();
    }
    if source == target {
        return vec![vec![source]];
    }

    let no_nodes = HashSet::new();
    let no_edges = HashSet::new();
    let Some(shortest) = bfs_path_avoiding(graph, source, target, &no_nodes, &no_edges) else {
        return Vec::new();
    };

    let mut accepted = vec![shortest];
    let mut candidates: Vec<Vec<NodeIndex>> = Vec::new();

    while accepted.len() < k {
        let last = &accepted[accepted.len() - 1];
        for i in 0..last.len() - 1 {
            let spur = last[i];
            let root = &last[..=i];

            let blocked_edges: HashSet<EdgeIndex> = accepted
                .iter()
                .filter(|path| path.len() > i + 1 && &path[..=i] == root)
                .filter_map(|path| graph.find_edge(path[i], path[i + 1]))
                .collect();
            let blocked_nodes: HashSet<NodeIndex> = root[..i].iter().copied().collect();

            if let Some(spur_path) = bfs_path_avoiding(graph, spur, target, &blocked_nodes, &blocked_edges) {
                let mut path = root[..i].to_vec();
                path.extend(spur_path);
                if !accepted.contains(&path) && !candidates.contains(&path) {
                    candidates.push(path);
                }
            }
        }

        // Shortest candidate, earliest discovered on ties
        let Some((best, _)) = candidates
            .iter()
            .enumerate()
            .min_by_key(|(pos, path)| (path.len(), *pos))
        else {
            break;
        };
        accepted.push(candidates.remove(best));
    }
    accepted
}
