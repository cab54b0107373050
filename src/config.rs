//! Configuration file support for traffic-graph
//!
//! This module handles parsing and applying `.traffic-graph.toml` files that
//! narrow which capture lines feed the graph and how the tables are written.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .traffic-graph.toml
//!
//! [input]
//! # Only keep lines whose payload starts with this protocol tag
//! protocol = "tcp"
//!
//! [filter]
//! # Hosts to drop entirely (glob patterns, matched against the port-stripped host)
//! exclude_hosts = ["127.0.0.*", "ff02::*"]
//!
//! [output]
//! # Table format: "json" (columnar) or "csv"
//! format = "csv"
//! # Directory receiving nodes.<ext> and edges.<ext>
//! directory = "out"
//!
//! [summary]
//! # Number of top talkers listed in summaries
//! top = 10
//! ```

use glob::Pattern;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::output::TableFormat;
use crate::parser::LogLine;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(String),
}

/// Input configuration section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InputConfig {
    /// Required protocol tag (case-insensitive), e.g. "tcp"
    #[serde(default)]
    pub protocol: Option<String>,
}

/// Host filter configuration section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilterConfig {
    /// Host glob patterns to drop
    #[serde(default)]
    pub exclude_hosts: Vec<String>,
}

/// Output configuration section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Option<TableFormat>,

    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Summary configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    /// Number of top hosts/edges shown in summaries
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_top() -> usize {
    10
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { top: default_top() }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GraphConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Compiled configuration with glob patterns
#[derive(Debug)]
pub struct CompiledConfig {
    /// Lowercased protocol tag lines must carry
    protocol: Option<String>,
    /// Patterns for excluded hosts
    exclude_patterns: Vec<Pattern>,

    pub format: TableFormat,
    pub output_dir: PathBuf,
    pub top: usize,

    /// Cache of host -> excluded
    cache: HashMap<String, bool>,
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|e| ConfigError::PatternError(format!("{}: {}", p, e))))
        .collect()
}

impl CompiledConfig {
    /// Create a compiled config from raw config
    pub fn from_config(config: GraphConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            protocol: config
                .input
                .protocol
                .filter(|p| !p.is_empty())
                .map(|p| p.to_ascii_lowercase()),
            exclude_patterns: compile_patterns(&config.filter.exclude_hosts)?,
            format: config.output.format.unwrap_or_default(),
            output_dir: config
                .output
                .directory
                .unwrap_or_else(|| PathBuf::from(".")),
            top: config.summary.top,
            cache: HashMap::new(),
        })
    }

    /// Create an empty config (accept every well-formed line)
    pub fn empty() -> Self {
        Self {
            protocol: None,
            exclude_patterns: Vec::new(),
            format: TableFormat::default(),
            output_dir: PathBuf::from("."),
            top: default_top(),
            cache: HashMap::new(),
        }
    }

    /// Override the protocol filter (used by CLI --protocol)
    pub fn set_protocol(&mut self, protocol: &str) {
        self.protocol = Some(protocol.to_ascii_lowercase()).filter(|p| !p.is_empty());
    }

    /// Add extra exclusion patterns (used by CLI --exclude-host)
    pub fn add_exclude_hosts(&mut self, patterns: &[String]) -> Result<(), ConfigError> {
        self.exclude_patterns.extend(compile_patterns(patterns)?);
        self.cache.clear();
        Ok(())
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Whether any line-level filtering is configured
    pub fn has_filters(&self) -> bool {
        self.protocol.is_some() || !self.exclude_patterns.is_empty()
    }

    /// Check if a host matches an exclusion pattern
    pub fn is_excluded_host(&mut self, host: &str) -> bool {
        if let Some(cached) = self.cache.get(host) {
            return *cached;
        }

        let result = self.exclude_patterns.iter().any(|p| p.matches(host));
        self.cache.insert(host.to_string(), result);
        result
    }

    /// Check if a parsed line passes the protocol and host filters
    pub fn accepts(&mut self, line: &LogLine) -> bool {
        if let Some(protocol) = &self.protocol
            && !line.protocol.eq_ignore_ascii_case(protocol)
        {
            return false;
        }

        !(self.is_excluded_host(&line.source) || self.is_excluded_host(&line.target))
    }
}

/// Load configuration starting from the given path
///
/// Searches for `.traffic-graph.toml` in the given directory and parent directories.
pub fn load_config(start_path: &Path) -> Result<GraphConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => read_config_file(&path),
        None => Ok(GraphConfig::default()),
    }
}

/// Read and parse a specific config file
pub fn read_config_file(path: &Path) -> Result<GraphConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GraphConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = [".traffic-graph.toml", "traffic-graph.toml"];

    let file_name = start_path.file_name().and_then(|f| f.to_str());
    if start_path.is_file() && config_names.iter().any(|n| file_name == Some(*n)) {
        return Some(start_path.to_path_buf());
    }

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}

/// Load and compile configuration
pub fn load_compiled_config(start_path: &Path) -> Result<CompiledConfig, ConfigError> {
    let config = load_config(start_path)?;
    CompiledConfig::from_config(config)
}
