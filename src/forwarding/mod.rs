//! Address learning and frame flooding over a converged spanning tree.
//!
//! After convergence, a transfer between two hosts walks the active
//! (non-blocked) ports. Every bridge the frame reaches learns the sender's
//! location; bridges that do not know the receiver flood the frame.

pub mod learner;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stp::{BridgeId, HostId, SegmentName};

pub use learner::FloodLearner;

/// Errors that can occur when running a transfer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Unknown host: {0} is not attached to any segment")]
    UnknownHost(HostId),
}

/// A requested frame transfer between two hosts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender: HostId,
    pub receiver: HostId,
}

impl TransferRequest {
    pub fn new(sender: impl Into<HostId>, receiver: impl Into<HostId>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }
}

/// Result of one host-to-host transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub sender: HostId,
    pub receiver: HostId,
    /// True if the frame reached the receiver's segment
    pub delivered: bool,
    /// Segments the frame was put on, in visiting order
    pub visited_segments: Vec<SegmentName>,
    /// Bridges that had no entry for the receiver and flooded the frame
    pub flooded: Vec<BridgeId>,
    /// Forwarding table of every bridge the frame reached, after learning
    pub tables: BTreeMap<BridgeId, BTreeMap<HostId, SegmentName>>,
}
