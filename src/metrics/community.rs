//! Community detection (Louvain) and weighted modularity.
//!
//! Louvain alternates two phases until modularity stops improving:
//!
//! 1. **Local moves**: each node moves to the neighboring community with the
//!    largest modularity gain, sweeping nodes in ascending id order until a
//!    full sweep moves nothing.
//! 2. **Aggregation**: each community becomes one node; intra-community
//!    weight becomes a self-loop, inter-community weights are summed.
//!
//! Node order is fixed, so the partition is deterministic for a given graph.

use std::collections::BTreeMap;

use crate::model::{CoherenceGraph, NodeId};
use crate::{Error, Result};

/// Node → community label. Labels are dense, numbered by first appearance
/// in ascending node order.
pub type Partition = BTreeMap<NodeId, usize>;

/// Stop aggregating once a level improves modularity by less than this.
const MIN_GAIN: f64 = 1e-7;

/// Upper bound on local-move sweeps per level.
const MAX_SWEEPS: usize = 1_000;

/// Modularity of `partition` on `graph`, using edge weights.
///
/// `Q = Σ_c [ W_in(c) / m − (D(c) / 2m)² ]` with `m` the total edge weight,
/// `W_in(c)` the weight inside community `c` and `D(c)` its weighted degree.
pub fn modularity(graph: &CoherenceGraph, partition: &Partition) -> Result<f64> {
    let m = graph.total_weight();
    if !(m > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "modularity needs positive total edge weight, got {m}"
        )));
    }

    let mut inside: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degree: BTreeMap<usize, f64> = BTreeMap::new();
    for v in graph.nodes() {
        let c = *partition
            .get(&v)
            .ok_or_else(|| Error::InvalidParameter(format!("node {v} missing from partition")))?;
        *degree.entry(c).or_default() += graph.weighted_degree(v);
    }
    for e in graph.edges() {
        if partition[&e.source] == partition[&e.target] {
            *inside.entry(partition[&e.source]).or_default() += e.weight;
        }
    }

    Ok(degree
        .iter()
        .map(|(c, d)| {
            let w_in = inside.get(c).copied().unwrap_or(0.0);
            w_in / m - (d / (2.0 * m)).powi(2)
        })
        .sum())
}

/// Greedy modularity partition.
pub fn louvain_partition(graph: &CoherenceGraph) -> Partition {
    let nodes: Vec<NodeId> = graph.nodes().collect();
    let mut level = LevelGraph::of(graph, &nodes);
    let mut assignment: Vec<usize> = (0..nodes.len()).collect();

    if level.m > 0.0 {
        let mut q = level.singleton_modularity();
        loop {
            let Some(communities) = level.local_moves() else { break };
            let (labels, count) = renumber(&communities);
            for a in assignment.iter_mut() {
                *a = labels[*a];
            }
            level = level.aggregate(&labels, count);
            let next_q = level.singleton_modularity();
            if next_q - q < MIN_GAIN {
                break;
            }
            q = next_q;
        }
    }

    let (labels, _) = renumber(&assignment);
    nodes.into_iter().zip(labels).collect()
}

// ============================================================================
// Level graph
// ============================================================================

/// Weighted graph over dense indices, with self-loops, for one Louvain level.
struct LevelGraph {
    adj: Vec<Vec<(usize, f64)>>,
    loops: Vec<f64>,
    /// Weighted degree; a self-loop counts twice.
    degree: Vec<f64>,
    m: f64,
}

impl LevelGraph {
    fn of(graph: &CoherenceGraph, nodes: &[NodeId]) -> Self {
        let index = |id: NodeId| nodes.binary_search(&id).ok();
        let adj: Vec<Vec<(usize, f64)>> = nodes
            .iter()
            .map(|&v| {
                graph
                    .neighbors(v)
                    .filter_map(|(u, w)| index(u).map(|i| (i, w)))
                    .collect()
            })
            .collect();
        Self::from_parts(adj, vec![0.0; nodes.len()])
    }

    fn from_parts(adj: Vec<Vec<(usize, f64)>>, loops: Vec<f64>) -> Self {
        let degree: Vec<f64> = adj
            .iter()
            .zip(&loops)
            .map(|(nbrs, l)| nbrs.iter().map(|(_, w)| w).sum::<f64>() + 2.0 * l)
            .collect();
        let m = degree.iter().sum::<f64>() / 2.0;
        LevelGraph { adj, loops, degree, m }
    }

    fn singleton_modularity(&self) -> f64 {
        let two_m = 2.0 * self.m;
        self.loops
            .iter()
            .zip(&self.degree)
            .map(|(l, d)| l / self.m - (d / two_m).powi(2))
            .sum()
    }

    /// Phase 1. Returns the community of each node, or `None` if no node moved.
    fn local_moves(&self) -> Option<Vec<usize>> {
        let n = self.adj.len();
        let two_m = 2.0 * self.m;
        let mut community: Vec<usize> = (0..n).collect();
        let mut total: Vec<f64> = self.degree.clone();
        let mut any_move = false;

        for _ in 0..MAX_SWEEPS {
            let mut moved = false;
            for i in 0..n {
                let current = community[i];
                let k_i = self.degree[i];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &self.adj[i] {
                    *links.entry(community[j]).or_default() += w;
                }

                total[current] -= k_i;
                let gain = |c: usize, w: f64| w - total[c] * k_i / two_m;
                let mut best = current;
                let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
                for (&c, &w) in &links {
                    let g = gain(c, w);
                    if g > best_gain + f64::EPSILON {
                        best = c;
                        best_gain = g;
                    }
                }
                total[best] += k_i;

                if best != current {
                    community[i] = best;
                    moved = true;
                    any_move = true;
                }
            }
            if !moved {
                break;
            }
        }

        any_move.then_some(community)
    }

    /// Phase 2: collapse communities into nodes.
    fn aggregate(&self, labels: &[usize], count: usize) -> Self {
        let mut loops = vec![0.0; count];
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];

        for (i, nbrs) in self.adj.iter().enumerate() {
            let ci = labels[i];
            loops[ci] += self.loops[i];
            for &(j, w) in nbrs {
                if j <= i {
                    continue;
                }
                let cj = labels[j];
                if ci == cj {
                    loops[ci] += w;
                } else {
                    *links[ci].entry(cj).or_default() += w;
                    *links[cj].entry(ci).or_default() += w;
                }
            }
        }

        let adj = links.into_iter().map(|l| l.into_iter().collect()).collect();
        Self::from_parts(adj, loops)
    }
}

/// Relabel densely by first appearance. Returns labels and label count.
fn renumber(raw: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let labels: Vec<usize> = raw
        .iter()
        .map(|c| {
            let next = mapping.len();
            *mapping.entry(*c).or_insert(next)
        })
        .collect();
    (labels, mapping.len())
}
