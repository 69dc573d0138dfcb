//! Bridge state and the per-port role state machine.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{BridgeId, HostId, Message, PortRole, SegmentName, Vector};
use crate::trace::{TraceEvent, TraceKind};

/// Everything a bridge produced during one round
#[derive(Debug, Default, Clone)]
pub struct BridgeOutput {
    /// Outgoing messages keyed by port (segment) name
    pub batches: BTreeMap<SegmentName, Vec<Message>>,
    /// Trace events in the order they happened
    pub events: Vec<TraceEvent>,
}

impl BridgeOutput {
    pub fn produced(&self) -> bool {
        self.batches.values().any(|batch| !batch.is_empty())
    }
}

/// Snapshot of a bridge's port roles, in port order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortAssignment {
    pub port: SegmentName,
    pub role: PortRole,
}

/// A learning bridge running the spanning tree protocol
#[derive(Debug, Clone)]
pub struct Bridge {
    id: BridgeId,
    ports: BTreeMap<SegmentName, PortRole>,

    believed_root: BridgeId,
    distance_from_root: u32,
    closest_upstream_bridge: BridgeId,
    /// Port through which the current best vector was learned. None while root.
    root_port: Option<SegmentName>,

    best_received_per_port: BTreeMap<SegmentName, Vector>,
    inbox: Vec<Message>,

    forwarding_table: BTreeMap<HostId, SegmentName>,
}

impl Bridge {
    /// Create a bridge that believes itself root, with every port Designated
    pub fn new<I, S>(id: BridgeId, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SegmentName>,
    {
        let ports = ports
            .into_iter()
            .map(|port| (port.into(), PortRole::Designated))
            .collect();

        Self {
            believed_root: id.clone(),
            distance_from_root: 0,
            closest_upstream_bridge: id.clone(),
            root_port: None,
            id,
            ports,
            best_received_per_port: BTreeMap::new(),
            inbox: Vec::new(),
            forwarding_table: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &BridgeId {
        &self.id
    }

    pub fn believed_root(&self) -> &BridgeId {
        &self.believed_root
    }

    pub fn distance_from_root(&self) -> u32 {
        self.distance_from_root
    }

    pub fn closest_upstream_bridge(&self) -> &BridgeId {
        &self.closest_upstream_bridge
    }

    pub fn root_port(&self) -> Option<&str> {
        self.root_port.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.believed_root == self.id
    }

    pub fn has_port(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    pub fn port_role(&self, port: &str) -> Option<PortRole> {
        self.ports.get(port).copied()
    }

    pub fn port_names(&self) -> impl Iterator<Item = &SegmentName> {
        self.ports.keys()
    }

    pub fn roles(&self) -> Vec<PortAssignment> {
        self.ports
            .iter()
            .map(|(port, role)| PortAssignment { port: port.clone(), role: *role })
            .collect()
    }

    /// Best vector seen so far: (believed root, distance, closest upstream bridge)
    pub fn global_best(&self) -> Vector {
        Vector::new(
            self.believed_root.clone(),
            self.distance_from_root,
            self.closest_upstream_bridge.clone(),
        )
    }

    /// The vector this bridge advertises on its designated ports
    pub fn outgoing_vector(&self) -> Vector {
        Vector::new(self.believed_root.clone(), self.distance_from_root, self.id.clone())
    }

    pub fn best_received(&self, port: &str) -> Option<&Vector> {
        self.best_received_per_port.get(port)
    }

    pub fn pending_messages(&self) -> usize {
        self.inbox.len()
    }

    /// Queue messages for the next round
    pub fn deliver(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.inbox.extend(messages);
    }

    /// Run one protocol round: ingest the inbox, re-elect, assign roles, emit.
    pub fn step(&mut self, round: usize) -> BridgeOutput {
        let mut output = BridgeOutput::default();
        let mut improved = false;

        for message in std::mem::take(&mut self.inbox) {
            output.events.push(TraceEvent {
                round,
                bridge: self.id.clone(),
                kind: TraceKind::Received,
                vector: message.vector(),
            });

            if !self.ports.contains_key(&message.port) {
                log::warn!("Bridge {} dropped message for unknown port {}", self.id, message.port);
                continue;
            }

            self.record_on_port(&message);

            let hopped = message.hop();
            if hopped.vector().supersedes(&self.global_best(), &self.closest_upstream_bridge) {
                self.adopt(&hopped);
                improved = true;
                output.events.push(TraceEvent {
                    round,
                    bridge: self.id.clone(),
                    kind: TraceKind::Adopted,
                    vector: hopped.vector(),
                });
            }
        }

        self.assign_roles();

        let announce = round == 0 && self.is_root();
        if improved || announce {
            let outgoing = self.outgoing_vector();
            for (port, role) in &self.ports {
                if !announce && *role != PortRole::Designated {
                    continue;
                }
                output
                    .batches
                    .entry(port.clone())
                    .or_default()
                    .push(Message::advertise(&outgoing, port));
                output.events.push(TraceEvent {
                    round,
                    bridge: self.id.clone(),
                    kind: TraceKind::Sent,
                    vector: outgoing.clone(),
                });
            }
        }

        output
    }

    /// Keep the best vector heard on the arrival port. The tie-break is the
    /// recorded sender, so a repeat from the same bridge never replaces itself.
    fn record_on_port(&mut self, message: &Message) {
        let candidate = message.vector();
        let replace = match self.best_received_per_port.get(&message.port) {
            Some(current) => candidate.supersedes(current, &current.bridge),
            None => true,
        };
        if replace {
            self.best_received_per_port.insert(message.port.clone(), candidate);
        }
    }

    fn adopt(&mut self, hopped: &Message) {
        log::debug!(
            "Bridge {} adopts root {} at distance {} via {} on {}",
            self.id, hopped.root, hopped.distance, hopped.sender, hopped.port
        );
        self.believed_root = hopped.root.clone();
        self.distance_from_root = hopped.distance;
        self.closest_upstream_bridge = hopped.sender.clone();
        self.root_port = Some(hopped.port.clone());
    }

    /// Root port stays Root. Any other port is Designated when this bridge's
    /// own vector is the best one recorded for the segment, Blocked otherwise.
    fn assign_roles(&mut self) {
        let outgoing = self.outgoing_vector();

        for (port, role) in self.ports.iter_mut() {
            if self.root_port.as_deref() == Some(port.as_str()) {
                *role = PortRole::Root;
                continue;
            }

            let recorded = self
                .best_received_per_port
                .entry(port.clone())
                .or_insert_with(|| outgoing.clone());
            if outgoing.supersedes(recorded, &recorded.bridge) {
                *recorded = outgoing.clone();
            }

            *role = if recorded.bridge == self.id {
                PortRole::Designated
            } else {
                PortRole::Blocked
            };
        }
    }

    pub fn forwarding_table(&self) -> &BTreeMap<HostId, SegmentName> {
        &self.forwarding_table
    }

    pub fn lookup(&self, host: &str) -> Option<&SegmentName> {
        self.forwarding_table.get(host)
    }

    /// Learn `host` behind `port`. Existing entries are never overwritten.
    pub fn learn(&mut self, host: &str, port: &str) -> bool {
        if self.forwarding_table.contains_key(host) {
            return false;
        }
        self.forwarding_table.insert(host.to_string(), port.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: &str, root: &str, distance: u32, port: &str) -> Message {
        Message {
            sender: sender.into(),
            root: root.into(),
            distance,
            port: port.to_string(),
        }
    }

    #[test]
    fn test_new_bridge_believes_itself_root() {
        let bridge = Bridge::new("B3".into(), ["A", "B"]);
        assert!(bridge.is_root());
        assert_eq!(bridge.distance_from_root(), 0);
        assert_eq!(bridge.root_port(), None);
        assert!(bridge.roles().iter().all(|a| a.role == PortRole::Designated));
    }

    #[test]
    fn test_round_zero_announces_on_every_port() {
        let mut bridge = Bridge::new("B1".into(), ["A", "B"]);
        let output = bridge.step(0);
        assert!(output.produced());
        assert_eq!(output.batches.len(), 2);
        assert_eq!(output.batches["A"][0], msg("B1", "B1", 0, "A"));
        assert_eq!(output.events.len(), 2);

        // No further announcements without improvement
        let output = bridge.step(1);
        assert!(!output.produced());
    }

    #[test]
    fn test_adopts_better_root_and_sets_root_port() {
        let mut bridge = Bridge::new("B2".into(), ["A", "B"]);
        bridge.step(0);
        bridge.deliver(vec![msg("B1", "B1", 0, "A")]);
        let output = bridge.step(1);

        assert_eq!(bridge.believed_root().as_str(), "B1");
        assert_eq!(bridge.distance_from_root(), 1);
        assert_eq!(bridge.closest_upstream_bridge().as_str(), "B1");
        assert_eq!(bridge.root_port(), Some("A"));
        assert_eq!(bridge.port_role("A"), Some(PortRole::Root));
        assert_eq!(bridge.port_role("B"), Some(PortRole::Designated));

        // Improvement is relayed on designated ports only
        assert_eq!(output.batches.len(), 1);
        assert_eq!(output.batches["B"], vec![msg("B2", "B1", 1, "B")]);
    }

    #[test]
    fn test_ignores_worse_root() {
        let mut bridge = Bridge::new("B1".into(), ["A"]);
        bridge.step(0);
        bridge.deliver(vec![msg("B4", "B4", 0, "A")]);
        let output = bridge.step(1);
        assert!(bridge.is_root());
        assert!(!output.produced());
        assert_eq!(bridge.port_role("A"), Some(PortRole::Designated));
    }

    #[test]
    fn test_blocks_port_when_peer_has_equal_distance_and_lower_id() {
        let mut bridge = Bridge::new("B3".into(), ["Y", "Z"]);
        bridge.step(0);
        bridge.deliver(vec![msg("B1", "B1", 0, "Y")]);
        bridge.step(1);
        assert_eq!(bridge.port_role("Z"), Some(PortRole::Designated));

        bridge.deliver(vec![msg("B2", "B1", 1, "Z")]);
        let output = bridge.step(2);
        assert!(!output.produced());
        assert_eq!(bridge.port_role("Y"), Some(PortRole::Root));
        assert_eq!(bridge.port_role("Z"), Some(PortRole::Blocked));
    }

    #[test]
    fn test_keeps_designated_port_against_higher_id_peer() {
        let mut bridge = Bridge::new("B2".into(), ["X", "Z"]);
        bridge.step(0);
        bridge.deliver(vec![msg("B1", "B1", 0, "X")]);
        bridge.step(1);
        bridge.deliver(vec![msg("B3", "B1", 1, "Z")]);
        bridge.step(2);
        assert_eq!(bridge.port_role("Z"), Some(PortRole::Designated));
    }

    #[test]
    fn test_two_links_to_same_upstream_yield_single_root_port() {
        let mut bridge = Bridge::new("B2".into(), ["X", "Y"]);
        bridge.step(0);
        bridge.deliver(vec![msg("B1", "B1", 0, "X"), msg("B1", "B1", 0, "Y")]);
        bridge.step(1);

        let roots = bridge.roles().iter().filter(|a| a.role == PortRole::Root).count();
        assert_eq!(roots, 1);
        assert_eq!(bridge.root_port(), Some("X"));
        assert_eq!(bridge.port_role("Y"), Some(PortRole::Blocked));
    }

    #[test]
    fn test_single_port_bridge_is_never_blocked() {
        let mut bridge = Bridge::new("B5".into(), ["C"]);
        bridge.step(0);
        bridge.deliver(vec![msg("B3", "B1", 1, "C"), msg("B4", "B1", 1, "C")]);
        bridge.step(1);
        assert_eq!(bridge.port_role("C"), Some(PortRole::Root));
        assert_eq!(bridge.closest_upstream_bridge().as_str(), "B3");
    }

    #[test]
    fn test_learn_is_insert_only() {
        let mut bridge = Bridge::new("B1".into(), ["A", "B"]);
        assert!(bridge.learn("H1", "A"));
        assert!(!bridge.learn("H1", "B"));
        assert_eq!(bridge.lookup("H1").map(String::as_str), Some("A"));
    }
}
