//! Metric values: tagged success / undefined / error per metric field.
//!
//! A metric that failed carries its message in an `Error` variant, never in
//! a numeric slot, so downstream statistics cannot mistake it for a number.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::NodeId;

// ============================================================================
// Global (scalar) metric value
// ============================================================================

/// Outcome of one global metric on one graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// A numeric result. May be `+inf` (e.g. path length of a disconnected graph).
    Number(#[serde(with = "float_repr")] f64),
    /// The metric has no meaningful value for this graph (e.g. modularity without edges).
    Undefined,
    /// The computation failed; the message is kept for diagnostics.
    Error(String),
}

impl MetricValue {
    pub fn is_error(&self) -> bool { matches!(self, MetricValue::Error(_)) }
    pub fn is_undefined(&self) -> bool { matches!(self, MetricValue::Undefined) }

    /// The numeric value, including non-finite ones.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The numeric value if it is finite. Used where arithmetic follows.
    pub fn as_finite(&self) -> Option<f64> {
        self.as_number().filter(|v| v.is_finite())
    }
}

impl From<f64> for MetricValue { fn from(v: f64) -> Self { MetricValue::Number(v) } }
impl From<usize> for MetricValue { fn from(v: usize) -> Self { MetricValue::Number(v as f64) } }

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(v) => write!(f, "{v}"),
            MetricValue::Undefined => write!(f, "undefined"),
            MetricValue::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

// ============================================================================
// Node-level metric values
// ============================================================================

/// Outcome of one node-level metric on one graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NodeMetricValues {
    Values(BTreeMap<NodeId, f64>),
    Error(String),
}

impl NodeMetricValues {
    pub fn is_error(&self) -> bool { matches!(self, NodeMetricValues::Error(_)) }

    pub fn values(&self) -> Option<&BTreeMap<NodeId, f64>> {
        match self {
            NodeMetricValues::Values(v) => Some(v),
            NodeMetricValues::Error(_) => None,
        }
    }

    pub fn get(&self, node: NodeId) -> Option<f64> {
        self.values().and_then(|v| v.get(&node).copied())
    }
}

// ============================================================================
// Non-finite float encoding
// ============================================================================

/// JSON has no infinity or NaN. Finite floats are written as numbers,
/// the rest as the strings `"inf"`, `"-inf"` and `"nan"`.
pub(crate) mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            s.serialize_f64(*v)
        } else if v.is_nan() {
            s.serialize_str("nan")
        } else if v.is_sign_positive() {
            s.serialize_str("inf")
        } else {
            s.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(t) => match t.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("invalid float literal '{other}'"))),
            },
        }
    }
}
