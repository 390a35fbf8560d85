//! GraphML export of one connectivity graph for external tools.
//!
//! ```text
//! CoherenceGraph → write_graphml() → <graphml> document
//!   → open in Gephi / Cytoscape / networkx.read_graphml
//! ```
//!
//! Nodes keep their site ids; each edge carries a `weight` attribute.

use std::io::Write;

use crate::model::{CatalogKey, CoherenceGraph};
use crate::Result;

/// Conventional graph id for a catalog key, e.g. `graph_03_rest_DELTA`.
pub fn graph_id(key: &CatalogKey) -> String {
    format!(
        "graph_{}_{}_{}",
        key.subject,
        key.state,
        key.band.name().to_ascii_uppercase()
    )
}

/// Write `graph` as an undirected GraphML document.
pub fn write_graphml(graph: &CoherenceGraph, id: &str, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">"#
    )?;
    writeln!(writer, r#"  <key id="d0" for="edge" attr.name="weight" attr.type="double"/>"#)?;
    writeln!(writer, r#"  <graph id="{}" edgedefault="undirected">"#, escape(id))?;

    for node in graph.nodes() {
        writeln!(writer, r#"    <node id="{node}"/>"#)?;
    }
    for edge in graph.edges() {
        writeln!(
            writer,
            r#"    <edge source="{}" target="{}"><data key="d0">{}</data></edge>"#,
            edge.source,
            edge.target,
            format_weight(edge.weight)
        )?;
    }

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</graphml>")?;
    Ok(())
}

/// GraphML doubles follow XML Schema: `INF`, `-INF`, `NaN`.
fn format_weight(w: f64) -> String {
    if w.is_nan() {
        "NaN".into()
    } else if w.is_infinite() {
        if w > 0.0 { "INF".into() } else { "-INF".into() }
    } else {
        format!("{w}")
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
