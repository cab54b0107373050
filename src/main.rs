//! traffic-graph CLI - Capture log to host graph
//!
//! Reads packet-capture dumps and writes the node and edge tables.
//! Multiple capture files are parsed in parallel.
//!
//! Usage:
//!   traffic-graph [OPTIONS] [INPUT]...

use std::io::stdout;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use traffic_graph::{
    CompiledConfig, TableFormat, build_from_sources, load_compiled_config, print_json_summary,
    print_summary, read_config_file, resolve_sources, summarize,
    web::{ServerConfig, start_server},
    write_tables,
};

/// traffic-graph - Turn packet captures into a weighted host graph
#[derive(Parser, Debug)]
#[command(name = "traffic-graph")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Capture logs to read: files, directories, or `-` for stdin
    #[arg(default_value = "-")]
    inputs: Vec<PathBuf>,

    /// Directory for nodes.<ext> and edges.<ext> (default: config or `.`)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Table format
    #[arg(short, long, value_enum)]
    format: Option<TableFormat>,

    /// Only keep lines with this protocol tag (e.g. tcp)
    #[arg(long)]
    protocol: Option<String>,

    /// Drop lines touching hosts matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude_host: Vec<String>,

    /// Config file path (default: search for .traffic-graph.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a summary to stdout
    #[arg(short, long)]
    summary: bool,

    /// Print the summary as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Number of top hosts and edges in summaries
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Build the graph without writing tables
    #[arg(long)]
    no_write: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show timing information
    #[arg(long)]
    timing: bool,

    /// Number of threads for parallel parsing (default: all CPU cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,

    // === Web visualization options ===
    /// Start web server to browse the graph
    #[arg(long)]
    web: bool,

    /// Port for web server (default: 3000)
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Don't open browser automatically when starting web server
    #[arg(long)]
    no_open: bool,

    /// Allow cross-origin requests to the API
    #[arg(long)]
    cors: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "traffic_graph=debug"
    } else {
        "traffic_graph=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .unwrap_or_else(|e| tracing::warn!("Could not set thread count: {}", e));
    }

    let total_start = Instant::now();

    let mut config = load_config(&args)?;
    if let Some(protocol) = &args.protocol {
        config.set_protocol(protocol);
    }
    config.add_exclude_hosts(&args.exclude_host)?;

    let format = args.format.unwrap_or(config.format);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let top = args.top.unwrap_or(config.top);

    if config.has_filters() {
        tracing::debug!(
            protocol = config.protocol().unwrap_or("any"),
            "Line filters active"
        );
    }

    let sources = resolve_sources(&args.inputs)?;
    let source_names: Vec<String> = sources.iter().map(|s| s.display_name()).collect();
    tracing::info!("Reading {} capture source(s)", sources.len());

    let build_start = Instant::now();
    let graph = build_from_sources(&sources, config)?;
    let build_time = build_start.elapsed();

    let stats = *graph.stats();
    if args.timing {
        tracing::info!(
            "Graph built: {} hosts, {} edges from {} lines (took {:.2?})",
            graph.node_count(),
            graph.edge_count(),
            stats.lines_read,
            build_time
        );
    } else {
        tracing::info!(
            "Graph built: {} hosts, {} edges from {} lines",
            graph.node_count(),
            graph.edge_count(),
            stats.lines_read
        );
    }

    if !args.no_write {
        let written = write_tables(&graph, &output_dir, format)?;
        eprintln!(
            "Tables written to: {}, {}",
            written.nodes.display(),
            written.edges.display()
        );
    }

    if args.summary || args.json {
        let summary = summarize(&graph, &source_names, top);
        let mut out = stdout().lock();
        if args.json {
            print_json_summary(&summary, &mut out)?;
        } else {
            print_summary(&summary, &mut out)?;
        }
    }

    if args.timing {
        let total_time = total_start.elapsed();
        let lines_per_sec = stats.lines_read as f64 / total_time.as_secs_f64();
        eprintln!(
            "Total time: {:.2?} ({:.0} lines/sec)",
            total_time, lines_per_sec
        );
    }

    if args.web {
        let server_config = ServerConfig {
            port: args.port,
            open_browser: !args.no_open,
            cors: args.cors,
        };

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(start_server(graph, source_names, top, server_config))
            .map_err(|e| -> Box<dyn std::error::Error> { e })?;
    }

    Ok(())
}

/// Explicit --config file, otherwise search upward from the first input
fn load_config(args: &Args) -> Result<CompiledConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &args.config {
        let config = CompiledConfig::from_config(read_config_file(path)?)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    let start = args
        .inputs
        .iter()
        .find(|p| p.as_os_str() != "-")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    // No file found yields defaults; a file that fails to load is an error
    Ok(load_compiled_config(&start)?)
}
