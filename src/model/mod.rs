//! # Connectivity Graph Model
//!
//! Clean DTOs shared by every stage: decoder ↔ thresholder ↔ catalogs ↔
//! metrics ↔ significance testing.
//!
//! Design rule: this module is pure data. No I/O, no locks, no statistics.

pub mod key;
pub mod node;
pub mod graph;
pub mod value;

pub use key::{Band, State, CatalogKey};
pub use node::NodeId;
pub use graph::{CoherenceGraph, Edge};
pub use value::{MetricValue, NodeMetricValues};
