//! # cohesion: Functional-Connectivity Graph Analysis
//!
//! Turns per-subject coherence matrices (one flattened row per frequency
//! band, per behavioral state) into sparse weighted graphs, computes graph
//! metrics on each, and compares those metrics between two states across a
//! matched cohort.
//!
//! ## Design Principles
//!
//! 1. **Pure stages**: decode → build → threshold → metrics → significance are
//!    functions over immutable inputs
//! 2. **Typed catalogs**: `GraphCatalog` and `MetricsCatalog` are keyed by
//!    `(subject, state, band)` with insertion-ordered keys
//! 3. **Errors are values where they must not abort**: a failed metric is a
//!    `MetricValue::Error`, a skipped comparison is a `ComparisonOutcome::Skipped`
//! 4. **No I/O in the core**: rows come in as tokens, results go out as records
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cohesion::{AnalysisConfig, Band, Recording, SignificanceEngine, State, pipeline};
//!
//! # fn example(rows: Vec<Recording>) -> cohesion::Result<()> {
//! let config = AnalysisConfig::default();
//! let batch = pipeline::build_graph_catalog(&rows, &config)?;
//! let metrics = pipeline::compute_metrics_catalog(&batch.catalog, &Default::default());
//!
//! let engine = SignificanceEngine::new(&metrics);
//! let report = engine.compare_all(State::Rest, State::Film, &Band::ALL, config.alpha)?;
//! for ((band, metric), outcome) in report.iter() {
//!     println!("{band} {metric}: {outcome:?}");
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod config;
pub mod decode;
pub mod builder;
pub mod threshold;
pub mod catalog;
pub mod metrics;
pub mod stats;
pub mod significance;
pub mod pipeline;
pub mod export;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Band, State, CatalogKey, NodeId, CoherenceGraph, Edge,
    MetricValue, NodeMetricValues,
};

// ============================================================================
// Re-exports: Stages
// ============================================================================

pub use config::AnalysisConfig;
pub use decode::{RowDecoder, DecodedRow};
pub use builder::GraphBuilder;
pub use threshold::threshold;
pub use catalog::{Catalog, GraphCatalog, MetricsCatalog};
pub use catalog::store::{CatalogStore, MemoryStore, JsonFileStore};
pub use metrics::{GlobalMetric, NodeMetric, MetricId, MetricRecord, MetricsEngine};
pub use significance::{
    SignificanceEngine, ComparisonRecord, ComparisonOutcome, ComparisonReport, TestKind,
};
pub use pipeline::{Recording, BatchResult, RowFailure};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `position` is the token index when decoding, the edge index when building.
    #[error("Malformed row at position {position}: {message}")]
    MalformedRow { position: usize, message: String },

    #[error("Key not found: {0}")]
    KeyNotFound(CatalogKey),

    #[error("Metric '{metric}' failed: {message}")]
    MetricComputation { metric: String, message: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
