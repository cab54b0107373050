//! End-to-end tests: capture files on disk -> graph -> tables on disk

use std::fs;
use std::path::PathBuf;

use traffic_graph::{
    CompiledConfig, GraphConfig, TableFormat, build_from_reader, build_from_sources,
    load_compiled_config, resolve_sources, write_tables,
};

const CAPTURE_A: &str = "\
12:00:00.000001 IP 10.0.0.1.80 > 10.0.0.2.5000: tcp 100
12:00:00.000002 IP 10.0.0.2.5000 > 10.0.0.1.80: tcp 50
12:00:00.000003 IP 10.0.0.1.80 > 10.0.0.3.22: tcp 10
";

const CAPTURE_B: &str = "\
12:00:01.000001 IP 10.0.0.4.443 > 10.0.0.1.51000: tcp 1500
12:00:01.000002 ARP, Request who-has 10.0.0.9 tell 10.0.0.4, length 28
12:00:01.000003 IP 10.0.0.3.22 > 10.0.0.1.80: tcp 5
12:00:01.000004 IP 10.0.0.5.53 > 10.0.0.1.40000: udp 80
";

fn write_captures(dir: &std::path::Path) -> Vec<PathBuf> {
    let a = dir.join("a.txt");
    let b = dir.join("b.txt");
    fs::write(&a, CAPTURE_A).unwrap();
    fs::write(&b, CAPTURE_B).unwrap();
    vec![a, b]
}

#[test]
fn test_files_are_folded_in_argument_order() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_captures(dir.path());

    let sources = resolve_sources(&paths).unwrap();
    let graph = build_from_sources(&sources, CompiledConfig::empty()).unwrap();

    let ids: Vec<_> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"]
    );
    assert_eq!(graph.edge_between("10.0.0.1", "10.0.0.3").unwrap().weight, 15);
    assert_eq!(graph.stats().lines_skipped, 1);
    assert_eq!(graph.stats().lines_read, 7);
}

#[test]
fn test_parallel_read_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_captures(dir.path());

    let sources = resolve_sources(&paths).unwrap();
    let parallel = build_from_sources(&sources, CompiledConfig::empty()).unwrap();

    let joined = format!("{}{}", CAPTURE_A, CAPTURE_B);
    let sequential = build_from_reader(joined.as_bytes(), CompiledConfig::empty()).unwrap();

    assert_eq!(parallel.nodes(), sequential.nodes());
    assert_eq!(parallel.edges(), sequential.edges());
    assert_eq!(parallel.stats(), sequential.stats());
}

#[test]
fn test_config_file_filters_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    write_captures(dir.path());
    fs::write(
        dir.path().join(".traffic-graph.toml"),
        r#"
        [input]
        protocol = "tcp"

        [filter]
        exclude_hosts = ["10.0.0.4"]

        [output]
        format = "csv"
        "#,
    )
    .unwrap();

    let config = load_compiled_config(dir.path()).unwrap();
    assert_eq!(config.format, TableFormat::Csv);

    let sources = resolve_sources(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(sources.len(), 2);

    let graph = build_from_sources(&sources, config).unwrap();
    assert_eq!(graph.stats().lines_filtered, 2);
    assert_eq!(graph.index_of("10.0.0.4"), None);
    assert_eq!(graph.index_of("10.0.0.5"), None);

    let out = dir.path().join("out");
    let written = write_tables(&graph, &out, TableFormat::Csv).unwrap();
    assert_eq!(
        fs::read_to_string(written.nodes).unwrap(),
        "id\n10.0.0.1\n10.0.0.2\n10.0.0.3\n"
    );
    assert_eq!(
        fs::read_to_string(written.edges).unwrap(),
        "source,target,weight\n0,1,150\n0,2,15\n"
    );
}

#[test]
fn test_empty_capture_writes_empty_tables() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.txt");
    fs::write(&empty, "").unwrap();

    let sources = resolve_sources(&[empty]).unwrap();
    let graph = build_from_sources(&sources, CompiledConfig::empty()).unwrap();
    assert!(graph.is_empty());

    let written = write_tables(&graph, dir.path(), TableFormat::Json).unwrap();
    let nodes: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(written.nodes).unwrap()).unwrap();
    let edges: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(written.edges).unwrap()).unwrap();

    assert_eq!(nodes, serde_json::json!({"id": []}));
    assert_eq!(
        edges,
        serde_json::json!({"source": [], "target": [], "weight": []})
    );
}

#[test]
fn test_config_defaults_when_absent() {
    let config = CompiledConfig::from_config(GraphConfig::default()).unwrap();
    assert!(!config.has_filters());
    assert_eq!(config.top, 10);
    assert_eq!(config.format, TableFormat::Json);
}
