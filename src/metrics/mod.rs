//! # Metrics Engine
//!
//! A fixed registry of graph metrics in two namespaces:
//!
//! | Namespace | Metric | Result |
//! |-----------|--------|--------|
//! | global | `node_count`, `edge_count`, `density` | scalar |
//! | global | `average_clustering`, `transitivity` | scalar |
//! | global | `modularity` | scalar, `Undefined` without edges |
//! | global | `average_shortest_path_length` | scalar, `+inf` when disconnected |
//! | node | `degree_centrality`, `clustering_coefficient` | node → scalar |
//!
//! Each metric is computed independently. A failure is stored as an error
//! marker for that metric alone; the rest of the record is unaffected.

pub mod clustering;
pub mod community;
pub mod paths;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{CoherenceGraph, MetricValue, NodeId, NodeMetricValues};
use crate::{Error, Result};

// ============================================================================
// Registry
// ============================================================================

/// Whole-graph scalar metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalMetric {
    NodeCount,
    EdgeCount,
    Density,
    AverageClustering,
    Transitivity,
    Modularity,
    AverageShortestPathLength,
}

impl GlobalMetric {
    pub const ALL: [GlobalMetric; 7] = [
        GlobalMetric::NodeCount,
        GlobalMetric::EdgeCount,
        GlobalMetric::Density,
        GlobalMetric::AverageClustering,
        GlobalMetric::Transitivity,
        GlobalMetric::Modularity,
        GlobalMetric::AverageShortestPathLength,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GlobalMetric::NodeCount => "node_count",
            GlobalMetric::EdgeCount => "edge_count",
            GlobalMetric::Density => "density",
            GlobalMetric::AverageClustering => "average_clustering",
            GlobalMetric::Transitivity => "transitivity",
            GlobalMetric::Modularity => "modularity",
            GlobalMetric::AverageShortestPathLength => "average_shortest_path_length",
        }
    }

    pub fn compute(self, graph: &CoherenceGraph) -> Result<MetricValue> {
        let value = match self {
            GlobalMetric::NodeCount => graph.node_count().into(),
            GlobalMetric::EdgeCount => graph.edge_count().into(),
            GlobalMetric::Density => density(graph).into(),
            GlobalMetric::AverageClustering => match clustering::average_clustering(graph) {
                Some(v) => v.into(),
                None => MetricValue::Undefined,
            },
            GlobalMetric::Transitivity => clustering::transitivity(graph).into(),
            GlobalMetric::Modularity => modularity(graph)?,
            GlobalMetric::AverageShortestPathLength => {
                match paths::average_shortest_path_length(graph) {
                    Some(v) => v.into(),
                    None => MetricValue::Undefined,
                }
            }
        };
        Ok(value)
    }
}

/// Per-node metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMetric {
    DegreeCentrality,
    ClusteringCoefficient,
}

impl NodeMetric {
    pub const ALL: [NodeMetric; 2] = [NodeMetric::DegreeCentrality, NodeMetric::ClusteringCoefficient];

    pub fn name(self) -> &'static str {
        match self {
            NodeMetric::DegreeCentrality => "degree_centrality",
            NodeMetric::ClusteringCoefficient => "clustering_coefficient",
        }
    }

    pub fn compute(self, graph: &CoherenceGraph) -> Result<BTreeMap<NodeId, f64>> {
        Ok(match self {
            NodeMetric::DegreeCentrality => degree_centrality(graph),
            NodeMetric::ClusteringCoefficient => clustering::clustering_by_node(graph),
        })
    }
}

/// Any registered metric, across both namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    Global(GlobalMetric),
    Node(NodeMetric),
}

impl MetricId {
    /// Every registered metric: globals first, then node-level.
    pub fn all() -> impl Iterator<Item = MetricId> {
        GlobalMetric::ALL
            .into_iter()
            .map(MetricId::Global)
            .chain(NodeMetric::ALL.into_iter().map(MetricId::Node))
    }

    pub fn name(self) -> &'static str {
        match self {
            MetricId::Global(m) => m.name(),
            MetricId::Node(m) => m.name(),
        }
    }
}

impl fmt::Display for GlobalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl fmt::Display for NodeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for MetricId {
    type Err = Error;

    /// Accepts registry names, plus `global_clustering_coefficient` for transitivity.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "global_clustering_coefficient" {
            return Ok(MetricId::Global(GlobalMetric::Transitivity));
        }
        MetricId::all()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown metric '{s}'")))
    }
}

// ============================================================================
// MetricRecord
// ============================================================================

/// All metric results for one graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub global: BTreeMap<GlobalMetric, MetricValue>,
    pub node: BTreeMap<NodeMetric, NodeMetricValues>,
}

impl MetricRecord {
    pub fn global_value(&self, metric: GlobalMetric) -> Option<&MetricValue> {
        self.global.get(&metric)
    }

    pub fn node_values(&self, metric: NodeMetric) -> Option<&NodeMetricValues> {
        self.node.get(&metric)
    }

    /// Metrics whose computation failed.
    pub fn errors(&self) -> Vec<MetricId> {
        let global = self
            .global
            .iter()
            .filter(|(_, v)| v.is_error())
            .map(|(m, _)| MetricId::Global(*m));
        let node = self
            .node
            .iter()
            .filter(|(_, v)| v.is_error())
            .map(|(m, _)| MetricId::Node(*m));
        global.chain(node).collect()
    }
}

// ============================================================================
// MetricsEngine
// ============================================================================

/// Computes a configurable subset of the registry. Defaults to all metrics.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    global: Vec<GlobalMetric>,
    node: Vec<NodeMetric>,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self {
            global: GlobalMetric::ALL.to_vec(),
            node: NodeMetric::ALL.to_vec(),
        }
    }
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(global: Vec<GlobalMetric>, node: Vec<NodeMetric>) -> Self {
        Self { global, node }
    }

    pub fn global_metrics(&self) -> &[GlobalMetric] { &self.global }
    pub fn node_metrics(&self) -> &[NodeMetric] { &self.node }

    pub fn compute(&self, graph: &CoherenceGraph) -> MetricRecord {
        let mut record = MetricRecord::default();

        for &metric in &self.global {
            let value = metric.compute(graph).unwrap_or_else(|e| {
                warn!(metric = metric.name(), error = %e, "global metric failed");
                MetricValue::Error(e.to_string())
            });
            record.global.insert(metric, value);
        }

        for &metric in &self.node {
            let values = match metric.compute(graph) {
                Ok(v) => NodeMetricValues::Values(v),
                Err(e) => {
                    warn!(metric = metric.name(), error = %e, "node metric failed");
                    NodeMetricValues::Error(e.to_string())
                }
            };
            record.node.insert(metric, values);
        }

        record
    }
}

// ============================================================================
// Metric functions
// ============================================================================

/// Edge count over possible edges. Zero for fewer than two nodes.
pub fn density(graph: &CoherenceGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    2.0 * graph.edge_count() as f64 / (n * (n - 1)) as f64
}

/// Degree over `n − 1`. A lone node has centrality 1.
pub fn degree_centrality(graph: &CoherenceGraph) -> BTreeMap<NodeId, f64> {
    let n = graph.node_count();
    if n <= 1 {
        return graph.nodes().map(|v| (v, 1.0)).collect();
    }
    let scale = 1.0 / (n - 1) as f64;
    graph
        .nodes()
        .map(|v| (v, graph.degree(v) as f64 * scale))
        .collect()
}

/// Modularity of the Louvain partition. `Undefined` for an edgeless graph.
fn modularity(graph: &CoherenceGraph) -> Result<MetricValue> {
    if graph.edge_count() == 0 {
        return Ok(MetricValue::Undefined);
    }
    if let Some(e) = graph.edges().find(|e| !(e.weight.is_finite() && e.weight >= 0.0)) {
        return Err(Error::MetricComputation {
            metric: GlobalMetric::Modularity.name().into(),
            message: format!(
                "edge ({}, {}) has weight {}; modularity needs non-negative finite weights",
                e.source, e.target, e.weight
            ),
        });
    }
    if graph.total_weight() == 0.0 {
        return Ok(MetricValue::Undefined);
    }
    let partition = community::louvain_partition(graph);
    Ok(community::modularity(graph, &partition)?.into())
}
