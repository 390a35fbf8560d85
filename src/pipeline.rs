//! # Batch Pipeline
//!
//! ```text
//! Recording rows ─► decode ─► build ─► threshold ─► GraphCatalog
//! GraphCatalog ─► MetricsEngine ─► MetricsCatalog
//! ```
//!
//! Each `(subject, state, band)` key is processed independently, across a
//! thread pool when the `parallel` feature is on. Results are inserted in
//! input order, so catalog key order does not depend on scheduling.

use tracing::{debug, info, warn};

use crate::builder::GraphBuilder;
use crate::catalog::{GraphCatalog, MetricsCatalog};
use crate::config::AnalysisConfig;
use crate::decode::RowDecoder;
use crate::metrics::{MetricRecord, MetricsEngine};
use crate::model::{Band, CatalogKey, CoherenceGraph, State};
use crate::threshold::threshold;
use crate::{Error, Result};

/// One flattened row for one `(subject, state, band)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub subject: String,
    pub state: State,
    pub band: Band,
    pub row: Vec<String>,
}

impl Recording {
    pub fn new(subject: impl Into<String>, state: State, band: Band, row: Vec<String>) -> Self {
        Self { subject: subject.into(), state, band, row }
    }

    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(self.subject.clone(), self.state, self.band)
    }
}

/// Pair the rows of one recording file with bands in declaration order.
pub fn recordings_from_rows(
    subject: &str,
    state: State,
    rows: Vec<Vec<String>>,
) -> Result<Vec<Recording>> {
    let count = rows.len();
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let band = Band::from_row_index(index).ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "{count} rows for subject {subject}, but only {} bands exist",
                    Band::ALL.len()
                ))
            })?;
            Ok(Recording::new(subject, state, band, row))
        })
        .collect()
}

/// A row that could not be turned into a graph.
#[derive(Debug)]
pub struct RowFailure {
    pub key: CatalogKey,
    pub error: Error,
}

/// Graph catalog plus the rows that failed. Failures never abort the batch.
#[derive(Debug)]
pub struct BatchResult {
    pub catalog: GraphCatalog,
    pub failures: Vec<RowFailure>,
}

/// Decode, build and threshold one recording.
pub fn process_recording(
    recording: &Recording,
    decoder: &RowDecoder,
    fraction: f64,
) -> Result<CoherenceGraph> {
    let decoded = decoder.decode(&recording.row)?;
    let raw = GraphBuilder::new().build_decoded(&decoded)?;
    let sparse = threshold(&raw, fraction)?;
    debug!(
        subject = %recording.subject,
        state = %recording.state,
        band = %recording.band,
        nodes = raw.node_count(),
        edges = raw.edge_count(),
        kept_edges = sparse.edge_count(),
        "recording processed"
    );
    Ok(sparse)
}

/// Build the thresholded graph catalog for a batch of recordings.
///
/// Fails only on an invalid configuration; malformed rows are collected in
/// `BatchResult::failures`. A key seen twice keeps the later graph.
pub fn build_graph_catalog(recordings: &[Recording], config: &AnalysisConfig) -> Result<BatchResult> {
    config.validate()?;
    let decoder = config.decoder();
    let fraction = config.threshold_fraction;

    let results = fan_out(recordings, |rec| process_recording(rec, &decoder, fraction));

    let catalog = GraphCatalog::new();
    let mut failures = Vec::new();
    for (rec, result) in recordings.iter().zip(results) {
        let key = rec.key();
        match result {
            Ok(graph) => {
                if catalog.put(key.clone(), graph) {
                    warn!(%key, "duplicate recording, previous graph replaced");
                }
            }
            Err(error) => {
                warn!(%key, %error, "row skipped");
                failures.push(RowFailure { key, error });
            }
        }
    }

    info!(
        recordings = recordings.len(),
        graphs = catalog.len(),
        failures = failures.len(),
        "graph catalog built"
    );
    Ok(BatchResult { catalog, failures })
}

/// Compute one metric record per graph, in graph catalog order.
pub fn compute_metrics_catalog(graphs: &GraphCatalog, engine: &MetricsEngine) -> MetricsCatalog {
    let entries = graphs.entries();
    let records: Vec<MetricRecord> = fan_out(&entries, |(_, graph)| engine.compute(graph));

    let catalog = MetricsCatalog::new();
    for ((key, _), record) in entries.into_iter().zip(records) {
        catalog.put(key, record);
    }
    info!(records = catalog.len(), "metrics catalog built");
    catalog
}

/// Map `f` over `items`, preserving order.
#[cfg(feature = "parallel")]
pub(crate) fn fan_out<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;
    items.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn fan_out<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.iter().map(f).collect()
}
