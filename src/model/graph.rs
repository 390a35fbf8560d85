//! Undirected, simple, weighted graph of recording sites.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::NodeId;
use crate::{Error, Result};

/// A weighted edge. Endpoints are stored with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(with = "super::value::float_repr")]
    pub weight: f64,
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId, weight: f64) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self { source, target, weight }
    }
}

/// Connectivity graph: no self-loops, no parallel edges.
///
/// Adjacency is kept in ordered maps so that node and edge iteration is
/// deterministic (ascending node id, edges by ascending `(source, target)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "GraphDoc", try_from = "GraphDoc")]
pub struct CoherenceGraph {
    adjacency: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
    edge_count: usize,
}

impl CoherenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an isolated node. Returns false if it already existed.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        self.adjacency.insert(id, BTreeMap::new());
        true
    }

    /// Add (or reweight) an undirected edge, creating missing endpoints.
    ///
    /// Returns the previous weight when the edge already existed.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f64) -> Result<Option<f64>> {
        if a == b {
            return Err(Error::InvalidParameter(format!("self-loop on node {a}")));
        }
        let previous = self.adjacency.entry(a).or_default().insert(b, weight);
        self.adjacency.entry(b).or_default().insert(a, weight);
        if previous.is_none() {
            self.edge_count += 1;
        }
        Ok(previous)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.adjacency.get(&a).and_then(|n| n.get(&b).copied())
    }

    pub fn contains_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.weight(a, b).is_some()
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Neighbors of `id` with edge weights, ascending by neighbor id.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|n| n.iter().map(|(k, w)| (*k, *w)))
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeMap::len)
    }

    /// Sum of incident edge weights.
    pub fn weighted_degree(&self, id: NodeId) -> f64 {
        self.neighbors(id).map(|(_, w)| w).sum()
    }

    /// Every edge once, ordered by ascending `(source, target)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().flat_map(|(&a, nbrs)| {
            nbrs.range(a..)
                .filter(move |(b, _)| **b != a)
                .map(move |(&b, &w)| Edge { source: a, target: b, weight: w })
        })
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> f64 {
        self.edges().map(|e| e.weight).sum()
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// Flat document form: node list plus edge list. Validated on the way in.
#[derive(Serialize, Deserialize)]
struct GraphDoc {
    nodes: Vec<NodeId>,
    edges: Vec<Edge>,
}

impl From<CoherenceGraph> for GraphDoc {
    fn from(g: CoherenceGraph) -> Self {
        GraphDoc {
            nodes: g.nodes().collect(),
            edges: g.edges().collect(),
        }
    }
}

impl TryFrom<GraphDoc> for CoherenceGraph {
    type Error = Error;

    fn try_from(doc: GraphDoc) -> Result<Self> {
        let mut g = CoherenceGraph::new();
        for id in doc.nodes {
            g.add_node(id);
        }
        for e in doc.edges {
            if !g.contains_node(e.source) || !g.contains_node(e.target) {
                return Err(Error::InvalidParameter(format!(
                    "edge ({}, {}) references a node outside the node list",
                    e.source, e.target
                )));
            }
            if g.add_edge(e.source, e.target, e.weight)?.is_some() {
                return Err(Error::InvalidParameter(format!(
                    "duplicate edge ({}, {})",
                    e.source, e.target
                )));
            }
        }
        Ok(g)
    }
}
