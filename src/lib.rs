//! # traffic-graph - Packet Capture to Host Graph
//!
//! Turns `tcpdump -q` style capture logs into a weighted undirected host
//! graph, written as two tables for bulk loading by layout, edge-bundling
//! and rasterization tooling.
//!
//! ## Usage
//!
//! ```bash
//! # Build tables from a capture dump
//! tcpdump -q -nn -r capture.pcap tcp > capture.txt
//! traffic-graph capture.txt -o out/
//!
//! # CSV tables, only TCP lines, ignoring loopback
//! traffic-graph --format csv --protocol tcp --exclude-host '127.0.0.*' captures/
//!
//! # Summarize without writing
//! traffic-graph --summary --no-write capture.txt
//! ```
//!
//! ## Tables
//!
//! ```text
//! nodes: id                      (row position = node index, first-seen order)
//! edges: source, target, weight  (unordered host pair, summed bytes)
//! ```
//!
//! ## Example
//!
//! ```
//! use traffic_graph::build_graph;
//!
//! let graph = build_graph([
//!     "IP 10.0.0.1.80 > 10.0.0.2.5000: tcp 100",
//!     "IP 10.0.0.2.5000 > 10.0.0.1.80: tcp 50",
//!     "IP 10.0.0.1.80 > 10.0.0.3.22: tcp 10",
//! ]);
//!
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.edges()[0].weight, 150);
//! assert_eq!(graph.edges()[1].weight, 10);
//! ```

pub mod cli_output;
pub mod config;
pub mod graph;
pub mod input;
pub mod output;
pub mod parser;
pub mod web;

pub use cli_output::{EdgeTraffic, RunSummary, print_json_summary, print_summary, summarize};
pub use config::{
    CompiledConfig, ConfigError, FilterConfig, GraphConfig, InputConfig, OutputConfig,
    SummaryConfig, load_compiled_config, load_config, read_config_file,
};
pub use graph::{
    BuildStats, Edge, GraphBuilder, HostTraffic, LineOutcome, Node, TrafficGraph, build_graph,
};
pub use input::{InputError, InputSource, build_from_reader, build_from_sources, resolve_sources};
pub use output::{
    EdgeColumns, NodeColumns, OutputError, TableFormat, WrittenTables, write_edge_table,
    write_node_table, write_tables,
};
pub use parser::{LogLine, strip_port};
