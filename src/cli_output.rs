//! Run summaries for the terminal and for automation
//!
//! - Text: counts plus the top talkers, written to any `Write`
//! - JSON: the same data, machine-readable

use std::io::{self, Write};

use serde::Serialize;

use crate::graph::{BuildStats, HostTraffic, TrafficGraph};

/// An edge resolved to host identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeTraffic {
    pub source: usize,
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub weight: u64,
}

/// Summary of one build
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sources: Vec<String>,
    pub stats: BuildStats,
    pub node_count: usize,
    pub edge_count: usize,
    pub self_loops: usize,
    pub total_weight: u64,
    pub top_hosts: Vec<HostTraffic>,
    pub top_edges: Vec<EdgeTraffic>,
}

/// Collect the summary for a graph, listing up to `top` hosts and edges
pub fn summarize(graph: &TrafficGraph, sources: &[String], top: usize) -> RunSummary {
    let top_edges = graph
        .top_edges(top)
        .into_iter()
        .map(|e| EdgeTraffic {
            source: e.source,
            target: e.target,
            source_id: graph.host(e.source).unwrap_or_default().to_string(),
            target_id: graph.host(e.target).unwrap_or_default().to_string(),
            weight: e.weight,
        })
        .collect();

    RunSummary {
        sources: sources.to_vec(),
        stats: *graph.stats(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        self_loops: graph.self_loop_count(),
        total_weight: graph.total_weight(),
        top_hosts: graph.top_hosts(top),
        top_edges,
    }
}

/// Write a human-readable summary
pub fn print_summary<W: Write>(summary: &RunSummary, writer: &mut W) -> io::Result<()> {
    let stats = &summary.stats;

    writeln!(writer, "Traffic Graph Summary")?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Hosts: {} | Edges: {} | Self-loops: {} | Bytes: {}",
        summary.node_count,
        summary.edge_count,
        summary.self_loops,
        format_bytes(summary.total_weight)
    )?;
    writeln!(
        writer,
        "Lines: {} read, {} accepted, {} malformed, {} filtered",
        stats.lines_read, stats.lines_accepted, stats.lines_skipped, stats.lines_filtered
    )?;

    if summary.node_count == 0 {
        writeln!(writer)?;
        writeln!(writer, "No traffic found.")?;
        return Ok(());
    }

    if !summary.top_hosts.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Top hosts:")?;
        for (rank, host) in summary.top_hosts.iter().enumerate() {
            writeln!(
                writer,
                "  {:>2}. {:<40} {:>10}  ({} peer{})",
                rank + 1,
                host.id,
                format_bytes(host.bytes),
                host.degree,
                if host.degree == 1 { "" } else { "s" }
            )?;
        }
    }

    if !summary.top_edges.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Top edges:")?;
        for (rank, edge) in summary.top_edges.iter().enumerate() {
            let pair = format!("{} <-> {}", edge.source_id, edge.target_id);
            writeln!(
                writer,
                "  {:>2}. {:<60} {:>10}",
                rank + 1,
                pair,
                format_bytes(edge.weight)
            )?;
        }
    }

    Ok(())
}

/// Write the summary as pretty JSON
pub fn print_json_summary<W: Write>(summary: &RunSummary, writer: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)
}

/// Format a byte count with a binary unit suffix
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
