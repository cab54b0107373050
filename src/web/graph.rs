//! Graph data structures for web visualization
//!
//! Converts a TrafficGraph to a JSON-serializable graph format
//! suitable for Cytoscape.js-style viewers.

use serde::Serialize;

use crate::cli_output::{RunSummary, summarize};
use crate::graph::TrafficGraph;

/// Complete graph data for visualization
#[derive(Debug, Clone, Serialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub summary: RunSummary,
}

/// A node in the traffic graph (represents a host)
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub index: usize,
    pub bytes: u64,
    pub degree: usize,
    /// Share of total traffic touching this host, 0.0-1.0
    pub share: f64,
}

/// An edge in the traffic graph (represents an undirected host pair)
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: u64,
    /// Weight relative to the heaviest edge, 0.0-1.0
    pub relative_weight: f64,
    pub self_loop: bool,
}

/// Convert a TrafficGraph to GraphData for visualization
pub fn traffic_to_graph(graph: &TrafficGraph, sources: &[String], top: usize) -> GraphData {
    let total = graph.total_weight();
    let max_weight = graph.edges().iter().map(|e| e.weight).max().unwrap_or(0);

    let nodes = graph
        .host_traffic()
        .into_iter()
        .map(|h| Node {
            id: h.index.to_string(),
            label: h.id,
            index: h.index,
            bytes: h.bytes,
            degree: h.degree,
            share: ratio(h.bytes, total),
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .enumerate()
        .map(|(i, e)| Edge {
            id: format!("e{}", i),
            source: e.source.to_string(),
            target: e.target.to_string(),
            weight: e.weight,
            relative_weight: ratio(e.weight, max_weight),
            self_loop: e.is_self_loop(),
        })
        .collect();

    GraphData {
        nodes,
        edges,
        summary: summarize(graph, sources, top),
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
