//! Recursive flood-and-learn traversal.

use std::collections::{BTreeMap, BTreeSet};

use super::{TransferError, TransferOutcome};
use crate::stp::{Bridge, BridgeId, Segment, SegmentName, Topology};

/// State of a single transfer's traversal.
///
/// The visited-segment set spans the whole traversal, so each segment is
/// entered at most once, and each bridge handles the frame at most once.
pub struct FloodLearner<'a> {
    bridges: &'a mut BTreeMap<BridgeId, Bridge>,
    segments: &'a BTreeMap<SegmentName, Segment>,
    sender: &'a str,
    receiver: &'a str,
    visited: BTreeSet<SegmentName>,
    visit_order: Vec<SegmentName>,
    touched: BTreeSet<BridgeId>,
    flooded: Vec<BridgeId>,
}

impl<'a> FloodLearner<'a> {
    pub fn new(
        bridges: &'a mut BTreeMap<BridgeId, Bridge>,
        segments: &'a BTreeMap<SegmentName, Segment>,
        sender: &'a str,
        receiver: &'a str,
    ) -> Self {
        Self {
            bridges,
            segments,
            sender,
            receiver,
            visited: BTreeSet::new(),
            visit_order: Vec::new(),
            touched: BTreeSet::new(),
            flooded: Vec::new(),
        }
    }

    /// Put the frame on `segment_name` and let every attached bridge react
    pub fn explore(&mut self, segment_name: &str) {
        if !self.visited.insert(segment_name.to_string()) {
            return;
        }
        self.visit_order.push(segment_name.to_string());

        let Some(segment) = self.segments.get(segment_name) else {
            return;
        };
        let attached: Vec<BridgeId> = segment.attached_bridges().cloned().collect();

        for id in attached {
            let Some(bridge) = self.bridges.get_mut(&id) else {
                continue;
            };
            if !bridge.port_role(segment_name).is_some_and(|role| role.is_forwarding()) {
                continue;
            }
            // The bridge that put the frame here already handled it
            if !self.touched.insert(id.clone()) {
                continue;
            }

            if bridge.learn(self.sender, segment_name) {
                log::debug!("Bridge {} learned {} on port {}", id, self.sender, segment_name);
            }

            let next: Vec<SegmentName> = match bridge.lookup(self.receiver) {
                Some(port) if port == segment_name => Vec::new(),
                Some(port) => vec![port.clone()],
                None => {
                    self.flooded.push(id.clone());
                    bridge
                        .port_names()
                        .filter(|port| port.as_str() != segment_name)
                        .filter(|port| bridge.port_role(port).is_some_and(|role| role.is_forwarding()))
                        .cloned()
                        .collect()
                }
            };

            for port in next {
                self.explore(&port);
            }
        }
    }

    fn finish(self, receiver_segment: &str) -> TransferOutcome {
        let tables = self
            .touched
            .iter()
            .filter_map(|id| self.bridges.get(id).map(|b| (id.clone(), b.forwarding_table().clone())))
            .collect();

        TransferOutcome {
            sender: self.sender.to_string(),
            receiver: self.receiver.to_string(),
            delivered: self.visited.contains(receiver_segment),
            visited_segments: self.visit_order,
            flooded: self.flooded,
            tables,
        }
    }
}

impl Topology {
    /// Send one frame from `sender` to `receiver`, learning along the way.
    ///
    /// Learned entries persist on the bridges for later transfers.
    pub fn transfer(&mut self, sender: &str, receiver: &str) -> Result<TransferOutcome, TransferError> {
        let sender_segment = self
            .segment_of_host(sender)
            .map(|segment| segment.name().to_string())
            .ok_or_else(|| TransferError::UnknownHost(sender.to_string()))?;
        let receiver_segment = self
            .segment_of_host(receiver)
            .map(|segment| segment.name().to_string())
            .ok_or_else(|| TransferError::UnknownHost(receiver.to_string()))?;

        log::info!(
            "Transfer {} ({}) -> {} ({})",
            sender, sender_segment, receiver, receiver_segment
        );

        let mut learner = FloodLearner::new(&mut self.bridges, &self.segments, sender, receiver);
        learner.explore(&sender_segment);
        let outcome = learner.finish(&receiver_segment);

        if !outcome.delivered {
            log::warn!("Frame from {} never reached {}", sender, receiver);
        }
        Ok(outcome)
    }
}
