//! EdgeThresholder: keep the strongest fraction of edges.

use std::cmp::Ordering;

use crate::model::{CoherenceGraph, Edge};
use crate::{Error, Result};

/// Keep the top `floor(edge_count * fraction)` edges by weight.
///
/// Edges are ranked by weight descending, ties by `(source, target)`
/// ascending. The result contains only endpoints of kept edges; nodes that
/// lose every edge are dropped. `fraction` must lie in `(0, 1]`.
pub fn threshold(graph: &CoherenceGraph, fraction: f64) -> Result<CoherenceGraph> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(Error::InvalidParameter(format!(
            "threshold fraction must be in (0, 1], got {fraction}"
        )));
    }

    let mut ranked: Vec<Edge> = graph.edges().collect();
    ranked.sort_by(rank);
    let keep = (ranked.len() as f64 * fraction).floor() as usize;

    let mut out = CoherenceGraph::new();
    for edge in ranked.into_iter().take(keep) {
        out.add_edge(edge.source, edge.target, edge.weight)?;
    }
    Ok(out)
}

/// Strongest first. `NaN` weights rank below every number.
fn rank(a: &Edge, b: &Edge) -> Ordering {
    a.weight
        .is_nan()
        .cmp(&b.weight.is_nan())
        .then_with(|| b.weight.total_cmp(&a.weight))
        .then_with(|| (a.source, a.target).cmp(&(b.source, b.target)))
}
