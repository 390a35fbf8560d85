//! Flattened coherence-matrix decoding.
//!
//! A row is the upper triangle of a symmetric `N × N` coherence matrix,
//! written block by block:
//!
//! ```text
//! id id | c12 c13 .. c1N 1.0 | c23 .. c2N 1.0 | ... | c(N-1)N 1.0 | [1.0]
//!       |<-- block 1 ------->|<-- block 2 --->|     |<- block N-1 ->|
//! ```
//!
//! Block `i` holds the coherence of node `i` to nodes `i+1..=N` and ends with
//! the sentinel (unit self-coherence). `N` is never written down: block 1
//! has `N - 1` values, so `N` is one more than the number of values before
//! the first sentinel.
//!
//! Decoding is two passes over the same cursor start: a count pass that
//! fixes `N`, then an edge pass that walks the blocks. Rows that end before
//! block `N - 1` is complete are accepted and yield the edges read so far.

use tracing::debug;

use crate::model::{Edge, NodeId};
use crate::{Error, Result};

/// Default number of identifying columns at the start of a row.
pub const DEFAULT_SKIP_COLUMNS: usize = 2;

/// Default block terminator.
pub const DEFAULT_SENTINEL: f64 = 1.0;

/// Output of decoding one row.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRow {
    /// Matrix dimension `N`; nodes are `1..=N`.
    pub node_count: usize,
    /// Edges in block order: ascending `i`, then ascending `j`.
    pub edges: Vec<Edge>,
}

/// Two-pass decoder for the sentinel-delimited row encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowDecoder {
    skip_columns: usize,
    sentinel: f64,
}

impl Default for RowDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_COLUMNS, DEFAULT_SENTINEL)
    }
}

impl RowDecoder {
    pub fn new(skip_columns: usize, sentinel: f64) -> Self {
        Self { skip_columns, sentinel }
    }

    pub fn skip_columns(&self) -> usize { self.skip_columns }
    pub fn sentinel(&self) -> f64 { self.sentinel }

    /// Decode a row of raw text tokens, skipping the identifying columns.
    pub fn decode<S: AsRef<str>>(&self, row: &[S]) -> Result<DecodedRow> {
        self.decode_with(row.len(), self.skip_columns, |pos| parse_token(row[pos].as_ref(), pos))
    }

    /// Decode a row that is already numeric and has no identifying columns.
    pub fn decode_values(&self, values: &[f64]) -> Result<DecodedRow> {
        self.decode_with(values.len(), 0, |pos| check_finite(values[pos], pos))
    }

    fn decode_with<F>(&self, len: usize, start: usize, value_at: F) -> Result<DecodedRow>
    where
        F: Fn(usize) -> Result<f64>,
    {
        let node_count = self.count_nodes(len, start, &value_at)?;
        // Short rows are legal, so size from the tokens present, not from N.
        let mut edges = Vec::with_capacity(len - start);

        let mut pos = start;
        'blocks: for i in 1..node_count {
            let mut j = i + 1;
            loop {
                if pos >= len {
                    debug!(node = i, node_count, "row ended before the last block, stopping early");
                    break 'blocks;
                }
                let value = value_at(pos)?;
                pos += 1;
                if value == self.sentinel {
                    break;
                }
                if j > node_count {
                    return Err(Error::MalformedRow {
                        position: pos - 1,
                        message: format!(
                            "block {i} holds more than {} values; expected sentinel {}",
                            node_count - i,
                            self.sentinel
                        ),
                    });
                }
                edges.push(Edge::new(node_id(i), node_id(j), value));
                j += 1;
            }
        }

        Ok(DecodedRow { node_count, edges })
    }

    /// Count pass: values before the first sentinel, plus one.
    fn count_nodes<F>(&self, len: usize, start: usize, value_at: &F) -> Result<usize>
    where
        F: Fn(usize) -> Result<f64>,
    {
        let mut pos = start;
        while pos < len {
            if value_at(pos)? == self.sentinel {
                return Ok(pos - start + 1);
            }
            pos += 1;
        }
        Err(Error::MalformedRow {
            position: len,
            message: format!("no sentinel {} found after column {start}", self.sentinel),
        })
    }
}

fn parse_token(token: &str, position: usize) -> Result<f64> {
    let value = token.trim().parse::<f64>().map_err(|_| Error::MalformedRow {
        position,
        message: format!("non-numeric token '{token}'"),
    })?;
    check_finite(value, position)
}

/// `NaN` and infinities parse as floats but are not coherence values.
fn check_finite(value: f64, position: usize) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::MalformedRow {
            position,
            message: format!("non-finite value {value}"),
        })
    }
}

fn node_id(i: usize) -> NodeId {
    NodeId(i as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_list(row: &DecodedRow) -> Vec<(u32, u32, f64)> {
        row.edges.iter().map(|e| (e.source.0, e.target.0, e.weight)).collect()
    }

    #[test]
    fn test_minimal_two_node_row() {
        let row = ["s1", "delta", "0.7", "1.0"];
        let decoded = RowDecoder::default().decode(&row).unwrap();
        assert_eq!(decoded.node_count, 2);
        assert_eq!(edge_list(&decoded), vec![(1, 2, 0.7)]);
    }

    #[test]
    fn test_three_node_row_with_trailing_sentinel() {
        let row = ["s1", "delta", "0.2", "0.4", "1.0", "0.3", "1.0", "1.0"];
        let decoded = RowDecoder::default().decode(&row).unwrap();
        assert_eq!(decoded.node_count, 3);
        assert_eq!(edge_list(&decoded), vec![(1, 2, 0.2), (1, 3, 0.4), (2, 3, 0.3)]);
    }

    #[test]
    fn test_four_node_full_row() {
        let row = [
            "s", "b", "0.1", "0.2", "0.3", "1", "0.4", "0.5", "1", "0.6", "1", "1",
        ];
        let decoded = RowDecoder::default().decode(&row).unwrap();
        assert_eq!(decoded.node_count, 4);
        assert_eq!(
            edge_list(&decoded),
            vec![(1, 2, 0.1), (1, 3, 0.2), (1, 4, 0.3), (2, 3, 0.4), (2, 4, 0.5), (3, 4, 0.6)]
        );
    }

    #[test]
    fn test_short_row_stops_early() {
        let row = ["s", "b", "0.1", "0.2", "0.3", "1.0", "0.4"];
        let decoded = RowDecoder::default().decode(&row).unwrap();
        assert_eq!(decoded.node_count, 4);
        assert_eq!(edge_list(&decoded), vec![(1, 2, 0.1), (1, 3, 0.2), (1, 4, 0.3), (2, 3, 0.4)]);
    }

    #[test]
    fn test_sentinel_first_is_single_node() {
        let decoded = RowDecoder::default().decode(&["s", "b", "1.0"]).unwrap();
        assert_eq!(decoded.node_count, 1);
        assert!(decoded.edges.is_empty());
    }

    #[test]
    fn test_missing_sentinel_is_malformed() {
        let err = RowDecoder::default().decode(&["s", "b", "0.5", "0.6"]).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { position: 4, .. }));
        assert!(RowDecoder::default().decode(&["s", "b"]).is_err());
    }

    #[test]
    fn test_non_numeric_token_is_malformed() {
        let err = RowDecoder::default().decode(&["s", "b", "0.5", "x", "1.0"]).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { position: 3, .. }));
    }

    #[test]
    fn test_non_finite_token_is_malformed() {
        let err = RowDecoder::default().decode(&["s", "b", "0.5", "NaN", "1.0"]).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { position: 3, .. }));
        let err = RowDecoder::default().decode(&["s", "b", "inf", "1.0"]).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { position: 2, .. }));
        let err = RowDecoder::default().decode_values(&[0.4, f64::NAN, 1.0]).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { position: 1, .. }));
    }

    #[test]
    fn test_tokens_past_the_last_block_are_not_scanned() {
        let row = ["s", "b", "0.5", "1.0", "0.9", "trailer"];
        let decoded = RowDecoder::default().decode(&row).unwrap();
        assert_eq!(edge_list(&decoded), vec![(1, 2, 0.5)]);
    }

    #[test]
    fn test_block_overrun_is_malformed() {
        let row = ["s", "b", "0.1", "0.2", "1.0", "0.3", "0.4", "1.0"];
        let err = RowDecoder::default().decode(&row).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { position: 6, .. }));
    }

    #[test]
    fn test_short_row_with_long_first_block() {
        let mut values = vec![0.5; 200_000];
        values.push(1.0);
        let decoded = RowDecoder::default().decode_values(&values).unwrap();
        assert_eq!(decoded.node_count, 200_001);
        assert_eq!(decoded.edges.len(), 200_000);
        assert_eq!(decoded.edges[199_999].target, NodeId(200_001));
    }

    #[test]
    fn test_zero_and_negative_weights_accepted() {
        let decoded = RowDecoder::default()
            .decode_values(&[0.0, -0.2, 1.0, 0.0, 1.0])
            .unwrap();
        assert_eq!(edge_list(&decoded), vec![(1, 2, 0.0), (1, 3, -0.2), (2, 3, 0.0)]);
    }

    #[test]
    fn test_custom_sentinel_and_offset() {
        let decoder = RowDecoder::new(1, -1.0);
        let decoded = decoder.decode(&["id", "0.4", "0.8", "-1", "0.6", "-1"]).unwrap();
        assert_eq!(decoded.node_count, 3);
        assert_eq!(edge_list(&decoded), vec![(1, 2, 0.4), (1, 3, 0.8), (2, 3, 0.6)]);
    }
}
