//! Node and edge table writers
//!
//! Two formats are supported:
//!
//! - `json`: columnar, one array per column
//!   (`{"id": [...]}` and `{"source": [...], "target": [...], "weight": [...]}`)
//! - `csv`: a header row followed by one record per table row
//!
//! Node rows carry no explicit index column; a node's index is its row position.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::TrafficGraph;

/// Errors that can occur while writing tables
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write table: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to encode table: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to write CSV table: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// On-disk table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Json,
    Csv,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Json => "json",
            TableFormat::Csv => "csv",
        }
    }
}

/// Node table in columnar layout
#[derive(Debug, Serialize)]
pub struct NodeColumns<'a> {
    pub id: Vec<&'a str>,
}

impl<'a> NodeColumns<'a> {
    pub fn from_graph(graph: &'a TrafficGraph) -> Self {
        Self {
            id: graph.nodes().iter().map(|n| n.id.as_str()).collect(),
        }
    }
}

/// Edge table in columnar layout
#[derive(Debug, Serialize)]
pub struct EdgeColumns {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub weight: Vec<u64>,
}

impl EdgeColumns {
    pub fn from_graph(graph: &TrafficGraph) -> Self {
        let edges = graph.edges();
        Self {
            source: edges.iter().map(|e| e.source).collect(),
            target: edges.iter().map(|e| e.target).collect(),
            weight: edges.iter().map(|e| e.weight).collect(),
        }
    }
}

/// Write the node table to the given writer
pub fn write_node_table<W: Write>(
    graph: &TrafficGraph,
    format: TableFormat,
    writer: &mut W,
) -> Result<(), OutputError> {
    match format {
        TableFormat::Json => {
            serde_json::to_writer(&mut *writer, &NodeColumns::from_graph(graph))?;
            writeln!(writer)?;
        }
        TableFormat::Csv => {
            let mut csv = csv::Writer::from_writer(&mut *writer);
            csv.write_record(["id"])?;
            for node in graph.nodes() {
                csv.write_record([node.id.as_str()])?;
            }
            csv.flush()?;
        }
    }
    Ok(())
}

/// Write the edge table to the given writer
pub fn write_edge_table<W: Write>(
    graph: &TrafficGraph,
    format: TableFormat,
    writer: &mut W,
) -> Result<(), OutputError> {
    match format {
        TableFormat::Json => {
            serde_json::to_writer(&mut *writer, &EdgeColumns::from_graph(graph))?;
            writeln!(writer)?;
        }
        TableFormat::Csv => {
            let mut csv = csv::Writer::from_writer(&mut *writer);
            csv.write_record(["source", "target", "weight"])?;
            for edge in graph.edges() {
                csv.write_record([
                    edge.source.to_string(),
                    edge.target.to_string(),
                    edge.weight.to_string(),
                ])?;
            }
            csv.flush()?;
        }
    }
    Ok(())
}

/// Paths of the tables written by [`write_tables`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTables {
    pub nodes: PathBuf,
    pub edges: PathBuf,
}

/// Write `nodes.<ext>` and `edges.<ext>` into `dir`, creating it if needed
pub fn write_tables(
    graph: &TrafficGraph,
    dir: &Path,
    format: TableFormat,
) -> Result<WrittenTables, OutputError> {
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let nodes = dir.join(format!("nodes.{}", format.extension()));
    let edges = dir.join(format!("edges.{}", format.extension()));

    let mut writer = BufWriter::new(File::create(&nodes)?);
    write_node_table(graph, format, &mut writer)?;
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(&edges)?);
    write_edge_table(graph, format, &mut writer)?;
    writer.flush()?;

    tracing::info!(
        nodes = %nodes.display(),
        edges = %edges.display(),
        "tables written"
    );

    Ok(WrittenTables { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;

    fn sample() -> TrafficGraph {
        build_graph([
            "IP 10.0.0.1.80 > 10.0.0.2.5000: tcp 100",
            "IP 10.0.0.2.5000 > 10.0.0.1.80: tcp 50",
            "IP 10.0.0.1.80 > 10.0.0.3.22: tcp 10",
        ])
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), OutputError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_json_tables_are_columnar() {
        let graph = sample();

        let nodes = render(|w| write_node_table(&graph, TableFormat::Json, w));
        let value: serde_json::Value = serde_json::from_str(&nodes).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": ["10.0.0.1", "10.0.0.2", "10.0.0.3"]})
        );

        let edges = render(|w| write_edge_table(&graph, TableFormat::Json, w));
        let value: serde_json::Value = serde_json::from_str(&edges).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"source": [0, 0], "target": [1, 2], "weight": [150, 10]})
        );
    }

    #[test]
    fn test_csv_tables() {
        let graph = sample();

        let nodes = render(|w| write_node_table(&graph, TableFormat::Csv, w));
        assert_eq!(nodes, "id\n10.0.0.1\n10.0.0.2\n10.0.0.3\n");

        let edges = render(|w| write_edge_table(&graph, TableFormat::Csv, w));
        assert_eq!(edges, "source,target,weight\n0,1,150\n0,2,10\n");
    }

    #[test]
    fn test_empty_graph_tables() {
        let graph = TrafficGraph::default();

        let edges = render(|w| write_edge_table(&graph, TableFormat::Csv, w));
        assert_eq!(edges, "source,target,weight\n");

        let nodes = render(|w| write_node_table(&graph, TableFormat::Json, w));
        assert_eq!(nodes.trim(), r#"{"id":[]}"#);
    }

    #[test]
    fn test_csv_quotes_awkward_host_names() {
        let graph = build_graph([
            "IP edge,gw.1 > say\"hi\".2: tcp 3",
            "IP 10.0.0.1.80 > edge,gw.9: tcp 4",
        ]);

        let nodes = render(|w| write_node_table(&graph, TableFormat::Csv, w));
        assert_eq!(nodes, "id\n\"edge,gw\"\n\"say\"\"hi\"\"\"\n10.0.0.1\n");

        let mut reader = csv::Reader::from_reader(nodes.as_bytes());
        let ids: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(ids, ["edge,gw", "say\"hi\"", "10.0.0.1"]);
    }

    #[test]
    fn test_write_tables_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");

        let written = write_tables(&sample(), &out, TableFormat::Csv).unwrap();
        assert_eq!(written.nodes, out.join("nodes.csv"));
        assert!(written.edges.exists());
        assert_eq!(
            fs::read_to_string(&written.edges).unwrap(),
            "source,target,weight\n0,1,150\n0,2,10\n"
        );
    }
}
