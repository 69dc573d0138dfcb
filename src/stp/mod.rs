//! Spanning tree protocol simulation.
//!
//! Bridges exchange configuration messages over shared segments in
//! synchronous rounds until every port has settled into a role.

pub mod types;
pub mod bridge;
pub mod segment;
pub mod topology;
pub mod convergence;

pub use types::{BridgeId, HostId, Message, PortRole, SegmentName, Vector};
pub use bridge::{Bridge, BridgeOutput, PortAssignment};
pub use segment::Segment;
pub use topology::{BridgeSpec, Topology, TopologyDescription, TopologyError};
pub use convergence::{converge, converge_with_cap, ConvergenceReport, DEFAULT_ROUND_CAP_FACTOR};
