//! Capture line parsing
//!
//! Recognizes the one-line-per-packet format printed by `tcpdump -q`:
//!
//! ```text
//! 12:00:01.000001 IP 10.0.0.1.80 > 10.0.0.2.5000: tcp 100
//! ```
//!
//! The leading timestamp is optional. Everything after the destination colon
//! is the payload summary; its first token is the transport protocol and its
//! last token is the byte count.

use std::sync::LazyLock;

use regex_lite::Regex;

/// `[timestamp] IP|IP6 <src> > <dst>: <rest>`
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\S+\s+)?IP6?\s+(\S+)\s+>\s+(\S+):(?:\s+(.*?))?\s*$")
        .expect("capture line pattern is valid")
});

/// One parsed capture record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Source host identifier (port stripped)
    pub source: String,
    /// Destination host identifier (port stripped)
    pub target: String,
    /// Transport protocol tag (first payload token), empty if absent
    pub protocol: String,
    /// Byte count from the trailing token, 0 when missing or not numeric
    pub bytes: u64,
}

impl LogLine {
    /// Parse a single capture line
    ///
    /// Returns `None` when the line does not have the expected shape.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = LINE_RE.captures(line)?;

        let source = strip_port(caps.get(1)?.as_str());
        let target = strip_port(caps.get(2)?.as_str());
        let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");

        let mut tokens = rest.split_whitespace();
        let protocol = tokens.next().unwrap_or("").to_string();
        let bytes = parse_byte_count(rest);

        Some(Self {
            source: source.to_string(),
            target: target.to_string(),
            protocol,
            bytes,
        })
    }
}

/// Drop the trailing `.port` segment from an address token
///
/// A token without any `.` is returned unchanged.
pub fn strip_port(token: &str) -> &str {
    match token.rsplit_once('.') {
        Some((host, _port)) => host,
        None => token,
    }
}

/// Parse the last whitespace token as a byte count
fn parse_byte_count(rest: &str) -> u64 {
    rest.split_whitespace()
        .next_back()
        .and_then(|t| t.parse::<u64>().ok())
        .unwrap_or(0)
}
