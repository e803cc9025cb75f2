//! Bounded simple-cycle enumeration.
//!
//! Cycles are searched in the directed closure of the undirected graph: every
//! edge stands for two opposite arcs, so each edge is itself a two-node cycle
//! and every longer loop shows up once per direction. Enumeration is
//! exponential in the worst case, so the search is capped both by the number
//! of cycles wanted and by a budget of expansion steps.

use petgraph::graph::{NodeIndex, UnGraph};

/// Outcome of a bounded cycle search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSearch {
    pub cycles: Vec<Vec<NodeIndex>>,
    /// True when the step budget ran out before the search finished
    pub budget_exhausted: bool,
}

/// Enumerate up to `limit` simple cycles of the directed closure.
///
/// Each cycle is reported starting from its lowest-index node, and cycles are
/// found in order of that start node.
pub fn simple_cycles<N, E>(graph: &UnGraph<N, E>, limit: usize, step_budget: usize) -> CycleSearch {
    let mut search = CycleSearch::default();
    if limit == 0 {
        return search;
    }

    let mut steps = 0usize;
    for start in graph.node_indices() {
        let mut path = vec![start];
        let mut on_path = vec![false; graph.node_count()];
        on_path[start.index()] = true;

        // Stack of pending neighbor lists, one per node on the path
        let mut stack: Vec<Vec<NodeIndex>> = vec![sorted_neighbors(graph, start)];

        while let Some(frontier) = stack.last_mut() {
            let Some(next) = frontier.pop() else {
                stack.pop();
                if let Some(node) = path.pop() {
                    on_path[node.index()] = false;
                }
                continue;
            };

            steps += 1;
            if steps > step_budget {
                search.budget_exhausted = true;
                return search;
            }

            if next == start {
                search.cycles.push(path.clone());
                if search.cycles.len() >= limit {
                    return search;
                }
            } else if next > start && !on_path[next.index()] {
                on_path[next.index()] = true;
                path.push(next);
                stack.push(sorted_neighbors(graph, next));
            }
        }
    }
    search
}

/// Neighbors in descending order so that popping yields ascending order
fn sorted_neighbors<N, E>(graph: &UnGraph<N, E>, node: NodeIndex) -> Vec<NodeIndex> {
    let mut neighbors: Vec<NodeIndex> = graph.neighbors(node).collect();
    neighbors.sort_unstable_by(|a, b| b.cmp(a));
    neighbors.dedup();
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> UnGraph<(), ()> {
        let mut graph = UnGraph::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        graph.add_edge(a, b, ());
        graph.add_edge(b, c, ());
        graph.add_edge(c, a, ());
        graph
    }

    #[test]
    fn test_every_edge_is_a_two_cycle() {
        let mut graph: UnGraph<(), ()> = UnGraph::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        graph.add_edge(a, b, ());

        let search = simple_cycles(&graph, 5, 1_000);
        assert_eq!(search.cycles, vec![vec![a, b]]);
        assert!(!search.budget_exhausted);
    }

    #[test]
    fn test_triangle_cycles() {
        let graph = triangle();
        let search = simple_cycles(&graph, 100, 1_000);
        // three two-cycles plus the triangle in both directions
        assert_eq!(search.cycles.len(), 5);
        assert_eq!(search.cycles.iter().filter(|c| c.len() == 3).count(), 2);
    }

    #[test]
    fn test_limit_caps_results() {
        let graph = triangle();
        assert_eq!(simple_cycles(&graph, 2, 1_000).cycles.len(), 2);
    }

    #[test]
    fn test_budget_stops_search() {
        let graph = triangle();
        let search = simple_cycles(&graph, 100, 1);
        assert!(search.budget_exhausted);
    }

    #[test]
    fn test_acyclic_empty_graph() {
        let graph: UnGraph<(), ()> = UnGraph::new_undirected();
        assert!(simple_cycles(&graph, 5, 100).cycles.is_empty());
    }
}
