//! Hop-count shortest paths.

use std::collections::VecDeque;

use crate::model::{CoherenceGraph, NodeId};

/// Dense index of a graph: node ids in ascending order plus index adjacency.
struct DenseGraph {
    nodes: Vec<NodeId>,
    adj: Vec<Vec<usize>>,
}

impl DenseGraph {
    fn of(graph: &CoherenceGraph) -> Self {
        let nodes: Vec<NodeId> = graph.nodes().collect();
        let adj = nodes
            .iter()
            .map(|&v| {
                graph
                    .neighbors(v)
                    .filter_map(|(u, _)| nodes.binary_search(&u).ok())
                    .collect()
            })
            .collect();
        DenseGraph { nodes, adj }
    }

    /// True when every node reaches every other. The null graph is not connected.
    fn is_connected(&self) -> bool {
        !self.nodes.is_empty() && self.bfs(0).iter().all(Option::is_some)
    }

    /// Hop distances from `source`; `None` for unreachable nodes.
    fn bfs(&self, source: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.nodes.len()];
        let mut queue = VecDeque::new();
        dist[source] = Some(0);
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            let next = dist[v].map_or(0, |d| d + 1);
            for &u in &self.adj[v] {
                if dist[u].is_none() {
                    dist[u] = Some(next);
                    queue.push_back(u);
                }
            }
        }
        dist
    }
}

/// Mean hop distance over all ordered node pairs.
///
/// `None` for the null graph, `0` for a single node, `+inf` when the graph
/// is disconnected.
pub fn average_shortest_path_length(graph: &CoherenceGraph) -> Option<f64> {
    let dense = DenseGraph::of(graph);
    let n = dense.nodes.len();
    match n {
        0 => return None,
        1 => return Some(0.0),
        _ => {}
    }

    if !dense.is_connected() {
        return Some(f64::INFINITY);
    }

    let total: usize = (0..n)
        .flat_map(|source| dense.bfs(source))
        .map(|d| d.unwrap_or(0))
        .sum();
    Some(total as f64 / (n * (n - 1)) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)]) -> CoherenceGraph {
        let mut g = CoherenceGraph::new();
        for &(a, b) in edges {
            g.add_edge(NodeId(a), NodeId(b), 0.5).unwrap();
        }
        g
    }

    #[test]
    fn test_path_graph_average() {
        // 1-2-3: distances 1,2,1 each way → 8 / 6.
        let g = graph(&[(1, 2), (2, 3)]);
        let aspl = average_shortest_path_length(&g).unwrap();
        assert!((aspl - 4.0 / 3.0).abs() < 1e-12);
        assert!(DenseGraph::of(&g).is_connected());
    }

    #[test]
    fn test_disconnected_is_infinite() {
        let g = graph(&[(1, 2), (3, 4)]);
        assert_eq!(average_shortest_path_length(&g), Some(f64::INFINITY));
        assert!(!DenseGraph::of(&g).is_connected());
    }

    #[test]
    fn test_degenerate_sizes() {
        let mut single = CoherenceGraph::new();
        single.add_node(NodeId(7));
        assert_eq!(average_shortest_path_length(&single), Some(0.0));
        assert_eq!(average_shortest_path_length(&CoherenceGraph::new()), None);
        assert!(!DenseGraph::of(&CoherenceGraph::new()).is_connected());
        assert!(DenseGraph::of(&single).is_connected());
    }
}
