//! Triangle-based clustering measures (unweighted).

use std::collections::BTreeMap;

use crate::model::{CoherenceGraph, NodeId};

/// Number of triangles through `v`.
pub fn triangles(graph: &CoherenceGraph, v: NodeId) -> usize {
    let mut count = 0;
    for (u, _) in graph.neighbors(v) {
        for (w, _) in graph.neighbors(u) {
            if w > u && w != v && graph.contains_edge(v, w) {
                count += 1;
            }
        }
    }
    count
}

/// Local clustering coefficient of `v`: closed neighbor pairs over all
/// neighbor pairs. Nodes with degree below 2 have coefficient 0.
pub fn local_clustering(graph: &CoherenceGraph, v: NodeId) -> f64 {
    let d = graph.degree(v);
    if d < 2 {
        return 0.0;
    }
    2.0 * triangles(graph, v) as f64 / (d * (d - 1)) as f64
}

pub fn clustering_by_node(graph: &CoherenceGraph) -> BTreeMap<NodeId, f64> {
    graph.nodes().map(|v| (v, local_clustering(graph, v))).collect()
}

/// Mean local clustering over every node. `None` for a graph without nodes.
pub fn average_clustering(graph: &CoherenceGraph) -> Option<f64> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }
    let sum: f64 = graph.nodes().map(|v| local_clustering(graph, v)).sum();
    Some(sum / n as f64)
}

/// Global clustering: `3 × triangles / connected triples`. Zero without triples.
pub fn transitivity(graph: &CoherenceGraph) -> f64 {
    let mut closed = 0usize;
    let mut triples = 0usize;
    for v in graph.nodes() {
        let d = graph.degree(v);
        closed += triangles(graph, v);
        triples += d * d.saturating_sub(1) / 2;
    }
    if closed == 0 || triples == 0 {
        return 0.0;
    }
    closed as f64 / triples as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)]) -> CoherenceGraph {
        let mut g = CoherenceGraph::new();
        for &(a, b) in edges {
            g.add_edge(NodeId(a), NodeId(b), 1.0).unwrap();
        }
        g
    }

    #[test]
    fn test_triangle_is_fully_clustered() {
        let g = graph(&[(1, 2), (2, 3), (1, 3)]);
        assert_eq!(triangles(&g, NodeId(1)), 1);
        assert_eq!(local_clustering(&g, NodeId(2)), 1.0);
        assert_eq!(average_clustering(&g), Some(1.0));
        assert_eq!(transitivity(&g), 1.0);
    }

    #[test]
    fn test_triangle_with_tail() {
        // 1-2-3 triangle, 3-4 tail.
        let g = graph(&[(1, 2), (2, 3), (1, 3), (3, 4)]);
        assert!((local_clustering(&g, NodeId(3)) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(local_clustering(&g, NodeId(4)), 0.0);
        let expected_avg = (1.0 + 1.0 + 1.0 / 3.0 + 0.0) / 4.0;
        assert!((average_clustering(&g).unwrap() - expected_avg).abs() < 1e-12);
        // 1 triangle, triples: 1 + 1 + 3 + 0 = 5 → 3/5.
        assert!((transitivity(&g) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_path_has_no_triangles() {
        let g = graph(&[(1, 2), (2, 3)]);
        assert_eq!(transitivity(&g), 0.0);
        assert_eq!(average_clustering(&g), Some(0.0));
    }

    #[test]
    fn test_null_graph() {
        let g = CoherenceGraph::new();
        assert_eq!(average_clustering(&g), None);
        assert_eq!(transitivity(&g), 0.0);
        assert!(clustering_by_node(&g).is_empty());
    }
}
