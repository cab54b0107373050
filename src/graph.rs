//! Traffic graph construction
//!
//! Folds parsed capture lines into a weighted undirected host graph:
//!
//! - every distinct host becomes a node, indexed in first-seen order
//! - every distinct unordered host pair becomes an edge whose weight is the
//!   sum of the byte counts observed between the two hosts, in either direction
//!
//! Flows from a host to itself are kept as self edges.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::CompiledConfig;
use crate::parser::LogLine;

/// A host in the node table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Host identifier (address without port)
    pub id: String,
    /// Position in the node table
    pub index: usize,
}

/// An undirected, weighted host pair
///
/// `source <= target` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    /// Accumulated byte count
    pub weight: u64,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Counters collected while building a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub lines_read: usize,
    pub lines_accepted: usize,
    /// Lines without the expected capture shape
    pub lines_skipped: usize,
    /// Well-formed lines dropped by protocol or host filters
    pub lines_filtered: usize,
    pub total_bytes: u64,
}

/// What happened to a single input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Accepted,
    Filtered,
    Malformed,
}

/// Incremental builder owning the node and edge tables for one run
#[derive(Debug)]
pub struct GraphBuilder {
    nodes: Vec<String>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<(usize, usize), usize>,
    stats: BuildStats,
    config: Option<CompiledConfig>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Builder accepting every well-formed line
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
            stats: BuildStats::default(),
            config: None,
        }
    }

    /// Builder applying the protocol and host filters of `config`
    pub fn with_config(config: CompiledConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new()
        }
    }

    /// Parse and record one raw capture line
    pub fn push_line(&mut self, raw: &str) -> LineOutcome {
        self.push_parsed(LogLine::parse(raw))
    }

    /// Record the result of parsing one line (`None` = malformed)
    pub fn push_parsed(&mut self, parsed: Option<LogLine>) -> LineOutcome {
        self.stats.lines_read += 1;

        let Some(line) = parsed else {
            self.stats.lines_skipped += 1;
            return LineOutcome::Malformed;
        };

        if let Some(config) = self.config.as_mut()
            && !config.accepts(&line)
        {
            self.stats.lines_filtered += 1;
            return LineOutcome::Filtered;
        }

        self.add(&line);
        self.stats.lines_accepted += 1;
        LineOutcome::Accepted
    }

    /// Accumulate a line into the tables, bypassing filters
    fn add(&mut self, line: &LogLine) {
        let source = self.intern(&line.source);
        let target = self.intern(&line.target);
        let key = (source.min(target), source.max(target));

        let edge_idx = match self.edge_index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.edges.len();
                self.edges.push(Edge {
                    source: key.0,
                    target: key.1,
                    weight: 0,
                });
                self.edge_index.insert(key, idx);
                idx
            }
        };

        let edge = &mut self.edges[edge_idx];
        edge.weight = edge.weight.saturating_add(line.bytes);
        self.stats.total_bytes = self.stats.total_bytes.saturating_add(line.bytes);
    }

    /// Return the index for `host`, registering it on first sight
    fn intern(&mut self, host: &str) -> usize {
        if let Some(&idx) = self.node_index.get(host) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(host.to_string());
        self.node_index.insert(host.to_string(), idx);
        idx
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Finish the run and hand off the tables
    pub fn build(self) -> TrafficGraph {
        if self.stats.lines_skipped > 0 {
            tracing::info!(
                skipped = self.stats.lines_skipped,
                read = self.stats.lines_read,
                "skipped malformed capture lines"
            );
        }
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            filtered = self.stats.lines_filtered,
            "graph built"
        );

        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, id)| Node { id, index })
            .collect();

        TrafficGraph {
            nodes,
            node_index: self.node_index,
            edges: self.edges,
            edge_index: self.edge_index,
            stats: self.stats,
        }
    }
}

/// Build a graph from raw lines with no filtering
pub fn build_graph<I, S>(lines: I) -> TrafficGraph
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GraphBuilder::new();
    for line in lines {
        builder.push_line(line.as_ref());
    }
    builder.build()
}

/// Traffic totals for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostTraffic {
    pub id: String,
    pub index: usize,
    /// Sum of the weights of all incident edges
    pub bytes: u64,
    /// Number of distinct peers (a self edge counts once)
    pub degree: usize,
}

/// The finished node and edge tables
#[derive(Debug, Clone, Default)]
pub struct TrafficGraph {
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    /// (lower, higher) node index -> edge row
    edge_index: HashMap<(usize, usize), usize>,
    stats: BuildStats,
}

impl TrafficGraph {
    /// Node table in first-seen order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edge table in first-observed order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, host: &str) -> Option<usize> {
        self.node_index.get(host).copied()
    }

    pub fn host(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|n| n.id.as_str())
    }

    /// Edge between two hosts, in either order
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        let idx = self.edge_index.get(&(a.min(b), a.max(b)))?;
        self.edges.get(*idx)
    }

    pub fn total_weight(&self) -> u64 {
        self.edges
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.weight))
    }

    pub fn self_loop_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_self_loop()).count()
    }

    /// Per-host traffic, indexed like the node table
    pub fn host_traffic(&self) -> Vec<HostTraffic> {
        let mut bytes = vec![0u64; self.nodes.len()];
        let mut degree = vec![0usize; self.nodes.len()];

        for edge in &self.edges {
            bytes[edge.source] = bytes[edge.source].saturating_add(edge.weight);
            degree[edge.source] += 1;
            if !edge.is_self_loop() {
                bytes[edge.target] = bytes[edge.target].saturating_add(edge.weight);
                degree[edge.target] += 1;
            }
        }

        self.nodes
            .iter()
            .map(|n| HostTraffic {
                id: n.id.clone(),
                index: n.index,
                bytes: bytes[n.index],
                degree: degree[n.index],
            })
            .collect()
    }

    /// Hosts with the most traffic; ties keep first-seen order
    pub fn top_hosts(&self, n: usize) -> Vec<HostTraffic> {
        let mut hosts = self.host_traffic();
        hosts.sort_by(|a, b| b.bytes.cmp(&a.bytes).then(a.index.cmp(&b.index)));
        hosts.truncate(n);
        hosts
    }

    /// Heaviest edges; ties keep first-observed order
    pub fn top_edges(&self, n: usize) -> Vec<Edge> {
        let mut edges = self.edges.clone();
        edges.sort_by(|a, b| b.weight.cmp(&a.weight));
        edges.truncate(n);
        edges
    }
}
