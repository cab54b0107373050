//! Web visualization module for traffic-graph
//!
//! Serves the built host graph over a local HTTP server so it can be
//! inspected in a browser or fetched by external layout/rendering tooling:
//! - Nodes: hosts with traffic totals and peer counts
//! - Edges: undirected host pairs weighted by bytes
//! - Tables: the node and edge tables in columnar JSON

pub mod graph;
pub mod routes;
pub mod server;

pub use graph::GraphData;
pub use server::{ServerConfig, start_server};
