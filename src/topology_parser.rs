//! Parser for the line-oriented topology format.
//!
//! ```text
//! 1            trace flag (0 or 1)
//! 3            number of bridges
//! B1: A B      bridge id, then the segments its ports attach to
//! B2: B C
//! B3: C
//! A: H1 H2     segment name, then the hosts living on it
//! B:
//! C: H3
//! 2            number of transfers (optional section)
//! H1 H3        sender and receiver
//! H3 H2
//! ```
//!
//! Blank lines are ignored. Once any segment line is given, every port must
//! name a listed segment; with no segment lines at all, segments are derived
//! from the port names and carry no hosts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use color_eyre::eyre::{Context, Result};
use regex::Regex;

use crate::forwarding::TransferRequest;
use crate::orchestrator::SimulationInput;
use crate::stp::{BridgeId, BridgeSpec, TopologyDescription};

/// Match "<name>: <items...>" for bridge and segment lines
static ENTRY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s:]+)\s*:\s*(.*)$").expect("Invalid entry line regex"));

/// Errors that can occur while parsing the text format
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Line {line}: expected {expected}, found '{found}'")]
    Invalid {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(&'static str),

    #[error("Line {line}: segment {name} is listed twice")]
    DuplicateSegment { line: usize, name: String },
}

fn invalid(line: usize, expected: &'static str, found: &str) -> ParseError {
    ParseError::Invalid {
        line,
        expected,
        found: found.to_string(),
    }
}

fn next_line<'a, I>(lines: &mut I, expected: &'static str) -> Result<(usize, &'a str), ParseError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    lines.next().ok_or(ParseError::UnexpectedEof(expected))
}

fn parse_count(line: usize, raw: &str, expected: &'static str) -> Result<usize, ParseError> {
    raw.parse::<usize>().map_err(|_| invalid(line, expected, raw))
}

/// Parse a complete simulation input from text
pub fn parse_topology(input: &str) -> Result<SimulationInput, ParseError> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(index, raw)| (index + 1, raw.trim()))
        .filter(|(_, raw)| !raw.is_empty())
        .peekable();

    let (line, raw) = next_line(&mut lines, "trace flag")?;
    let trace = raw
        .parse::<i64>()
        .map(|flag| flag != 0)
        .map_err(|_| invalid(line, "trace flag (0 or 1)", raw))?;

    let (line, raw) = next_line(&mut lines, "bridge count")?;
    let bridge_count = parse_count(line, raw, "bridge count")?;

    let mut bridges = Vec::with_capacity(bridge_count);
    for _ in 0..bridge_count {
        let (line, raw) = next_line(&mut lines, "bridge line")?;
        let caps = ENTRY_LINE
            .captures(raw)
            .ok_or_else(|| invalid(line, "bridge line '<id>: <ports>'", raw))?;
        let ports: Vec<String> = caps[2].split_whitespace().map(String::from).collect();
        if ports.is_empty() {
            return Err(invalid(line, "at least one port", raw));
        }
        bridges.push(BridgeSpec {
            id: BridgeId::new(&caps[1]),
            ports,
        });
    }

    let mut segments = BTreeMap::new();
    while let Some(&(line, raw)) = lines.peek() {
        let Some(caps) = ENTRY_LINE.captures(raw) else {
            break;
        };
        let name = caps[1].to_string();
        if segments.contains_key(&name) {
            return Err(ParseError::DuplicateSegment { line, name });
        }
        let hosts: Vec<String> = caps[2].split_whitespace().map(String::from).collect();
        segments.insert(name, hosts);
        lines.next();
    }

    let mut transfers = Vec::new();
    if let Some((line, raw)) = lines.next() {
        let transfer_count = parse_count(line, raw, "transfer count")?;
        for _ in 0..transfer_count {
            let (line, raw) = next_line(&mut lines, "transfer line")?;
            match raw.split_whitespace().collect::<Vec<_>>().as_slice() {
                [sender, receiver] => transfers.push(TransferRequest::new(*sender, *receiver)),
                _ => return Err(invalid(line, "transfer line '<sender> <receiver>'", raw)),
            }
        }
    }

    if let Some((line, raw)) = lines.next() {
        return Err(invalid(line, "end of input", raw));
    }

    log::debug!(
        "Parsed {} bridges, {} segments with hosts, {} transfers",
        bridges.len(),
        segments.len(),
        transfers.len()
    );

    Ok(SimulationInput {
        trace,
        description: TopologyDescription { bridges, segments },
        transfers,
    })
}

/// Read and parse a topology file
pub fn parse_topology_file(path: &Path) -> Result<SimulationInput> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read topology file '{}'", path.display()))?;
    parse_topology(&content).wrap_err_with(|| format!("Invalid topology file '{}'", path.display()))
}
