//! GraphBuilder: decoded row → `CoherenceGraph`.

use crate::decode::DecodedRow;
use crate::model::{CoherenceGraph, Edge, NodeId};
use crate::{Error, Result};

/// Materializes decoder output as a graph.
///
/// All nodes `1..=node_count` are added first so that sites without any
/// edge are still present before thresholding.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, node_count: usize, edges: &[Edge]) -> Result<CoherenceGraph> {
        let mut graph = CoherenceGraph::new();
        for i in 1..=node_count {
            graph.add_node(NodeId(i as u32));
        }

        for (position, edge) in edges.iter().enumerate() {
            let out_of_range = |id: NodeId| id.0 == 0 || id.0 as usize > node_count;
            if out_of_range(edge.source) || out_of_range(edge.target) {
                return Err(Error::MalformedRow {
                    position,
                    message: format!(
                        "edge #{position} ({}, {}) outside nodes 1..={node_count}",
                        edge.source, edge.target
                    ),
                });
            }
            let previous = graph
                .add_edge(edge.source, edge.target, edge.weight)
                .map_err(|e| Error::MalformedRow {
                    position,
                    message: format!("edge #{position}: {e}"),
                })?;
            if previous.is_some() {
                return Err(Error::MalformedRow {
                    position,
                    message: format!("edge #{position} duplicates ({}, {})", edge.source, edge.target),
                });
            }
        }

        Ok(graph)
    }

    /// Convenience for `build(row.node_count, &row.edges)`.
    pub fn build_decoded(&self, row: &DecodedRow) -> Result<CoherenceGraph> {
        self.build(row.node_count, &row.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(a: u32, b: u32, w: f64) -> Edge {
        Edge::new(NodeId(a), NodeId(b), w)
    }

    #[test]
    fn test_isolated_nodes_are_kept() {
        let g = GraphBuilder::new().build(4, &[e(1, 2, 0.3)]).unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.degree(NodeId(4)), 0);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let err = GraphBuilder::new()
            .build(3, &[e(1, 2, 0.3), e(2, 1, 0.4)])
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRow { position: 1, .. }));
        assert_eq!(err.to_string(), "Malformed row at position 1: edge #1 duplicates (1, 2)");
    }

    #[test]
    fn test_self_loop_rejected() {
        assert!(GraphBuilder::new().build(2, &[e(2, 2, 0.3)]).is_err());
    }

    #[test]
    fn test_endpoint_outside_node_range_rejected() {
        assert!(GraphBuilder::new().build(2, &[e(1, 3, 0.3)]).is_err());
    }
}
