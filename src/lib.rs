//! # Bridgesim - Spanning Tree Protocol and learning bridge simulator
//!
//! This library simulates the Spanning Tree Protocol over an arbitrary bridged
//! LAN, then simulates address learning and frame flooding across the
//! resulting tree.
//!
//! ## Overview
//!
//! Bridges are connected through shared segments (LANs). A segment is named
//! after the ports attached to it: every bridge port called `A` sits on
//! segment `A`. Hosts live on segments.
//!
//! The simulation runs in synchronous rounds. In each round every bridge
//! ingests the configuration messages it received, possibly adopts a better
//! (root, distance, sender) vector, reassigns its port roles and emits
//! messages; then every segment broadcasts what it was given to the other
//! attached bridges. Rounds repeat until nothing is in flight.
//!
//! Once the tree is stable, host-to-host transfers flood frames over the
//! non-blocked ports, and each bridge learns which port leads to the sender.
//!
//! ## Architecture
//!
//! - `stp`: vectors, bridges, segments, the round scheduler and the convergence loop
//! - `forwarding`: the flood-and-learn traversal
//! - `trace`: structured per-round events and their text rendering
//! - `topology_parser`: the line-oriented topology format
//! - `config` / `config_loader`: YAML configuration and input loading
//! - `orchestrator`: a complete run from input to report
//! - `report`: text and JSON rendering
//!
//! ## Example Usage
//!
//! ```rust
//! use bridgesim::orchestrator::{run_simulation, RunSettings};
//! use bridgesim::topology_parser::parse_topology;
//! use bridgesim::trace::NullObserver;
//!
//! let input = parse_topology("0\n3\nB1: X Y\nB2: X Z\nB3: Y Z\n")?;
//! let report = run_simulation(&input, RunSettings::default(), &mut NullObserver)?;
//!
//! assert!(report.convergence.converged);
//! assert_eq!(report.convergence.roots.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library operations return typed errors built with `thiserror`. File
//! loading and the binary use `color_eyre` for reports with context.

pub mod stp;
pub mod forwarding;
pub mod trace;
pub mod topology_parser;
pub mod config;
pub mod config_loader;
pub mod orchestrator;
pub mod report;
