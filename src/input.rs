//! Capture source discovery and reading
//!
//! Sources are files, directories (walked recursively, files sorted by path)
//! or `-` for stdin. Files are read and parsed in parallel via Rayon; the
//! parsed lines are then folded into the graph strictly in source order so
//! node indices match a sequential read.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::CompiledConfig;
use crate::graph::{GraphBuilder, TrafficGraph};
use crate::parser::LogLine;

/// Errors that can occur while reading capture input
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Input not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A single capture source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    pub fn display_name(&self) -> String {
        match self {
            InputSource::Stdin => "<stdin>".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }

    fn path(&self) -> PathBuf {
        match self {
            InputSource::Stdin => PathBuf::from("-"),
            InputSource::File(path) => path.clone(),
        }
    }
}

/// Expand CLI paths into concrete sources
///
/// Directories contribute every regular file below them, hidden entries
/// excluded, in path order.
pub fn resolve_sources(paths: &[PathBuf]) -> Result<Vec<InputSource>, InputError> {
    let mut sources = Vec::new();

    for path in paths {
        if path.as_os_str() == "-" {
            sources.push(InputSource::Stdin);
        } else if path.is_dir() {
            sources.extend(walk_capture_files(path)?.into_iter().map(InputSource::File));
        } else if path.is_file() {
            sources.push(InputSource::File(path.clone()));
        } else {
            return Err(InputError::NotFound(path.clone()));
        }
    }

    Ok(sources)
}

fn walk_capture_files(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Parse every line of a reader; invalid UTF-8 is replaced, not rejected
pub fn parse_reader<R: Read>(reader: R) -> io::Result<Vec<Option<LogLine>>> {
    let mut parsed = Vec::new();

    for chunk in BufReader::new(reader).split(b'\n') {
        let chunk = chunk?;
        let text = String::from_utf8_lossy(&chunk);
        parsed.push(LogLine::parse(text.trim_end_matches('\r')));
    }

    Ok(parsed)
}

fn parse_source(source: &InputSource) -> Result<Vec<Option<LogLine>>, InputError> {
    let result = match source {
        InputSource::Stdin => parse_reader(io::stdin().lock()),
        InputSource::File(path) => File::open(path).and_then(parse_reader),
    };

    result.map_err(|e| InputError::Read {
        path: source.path(),
        source: e,
    })
}

/// Read all sources and build the graph
pub fn build_from_sources(
    sources: &[InputSource],
    config: CompiledConfig,
) -> Result<TrafficGraph, InputError> {
    let parsed: Vec<Vec<Option<LogLine>>> = sources
        .par_iter()
        .map(parse_source)
        .collect::<Result<_, _>>()?;

    let mut builder = GraphBuilder::with_config(config);
    for (source, lines) in sources.iter().zip(parsed) {
        tracing::debug!(source = %source.display_name(), lines = lines.len(), "read capture");
        for line in lines {
            builder.push_parsed(line);
        }
    }

    Ok(builder.build())
}

/// Build the graph from an in-memory reader (no parallelism)
pub fn build_from_reader<R: BufRead>(
    reader: R,
    config: CompiledConfig,
) -> io::Result<TrafficGraph> {
    let mut builder = GraphBuilder::with_config(config);
    for chunk in reader.split(b'\n') {
        let chunk = chunk?;
        let text = String::from_utf8_lossy(&chunk);
        builder.push_line(text.trim_end_matches('\r'));
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_reader_handles_crlf_and_invalid_utf8() {
        let data = b"IP 10.0.0.1.80 > 10.0.0.2.5000: tcp 100\r\n\xff\xfe junk\n";
        let parsed = parse_reader(&data[..]).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].as_ref().unwrap().bytes, 100);
        assert!(parsed[1].is_none());
    }

    #[test]
    fn test_build_from_reader() {
        let data = "IP a.1 > b.2: tcp 3\nIP b.2 > a.1: tcp 4\n";
        let graph = build_from_reader(data.as_bytes(), CompiledConfig::empty()).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edges()[0].weight, 7);
    }

    #[test]
    fn test_resolve_directory_sorted_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();

        let sources = resolve_sources(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            sources,
            vec![
                InputSource::File(dir.path().join("a.txt")),
                InputSource::File(dir.path().join("b.txt")),
            ]
        );
    }

    #[test]
    fn test_missing_input() {
        let result = resolve_sources(&[PathBuf::from("/definitely/not/here.txt")]);
        assert!(matches!(result, Err(InputError::NotFound(_))));
    }

    #[test]
    fn test_stdin_marker() {
        let sources = resolve_sources(&[PathBuf::from("-")]).unwrap();
        assert_eq!(sources, vec![InputSource::Stdin]);
    }
}
