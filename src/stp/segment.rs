//! LAN segment: a shared broadcast medium between bridges and hosts.

use std::collections::BTreeMap;

use super::types::{BridgeId, HostId, Message, SegmentName};

#[derive(Debug, Clone)]
pub struct Segment {
    name: SegmentName,
    /// Attached bridges and whether their port onto this segment is Designated
    attached_bridges: BTreeMap<BridgeId, bool>,
    host_list: Vec<HostId>,
    pending: Vec<Message>,
}

impl Segment {
    pub fn new(name: impl Into<SegmentName>) -> Self {
        Self {
            name: name.into(),
            attached_bridges: BTreeMap::new(),
            host_list: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attach(&mut self, bridge: BridgeId) {
        self.attached_bridges.entry(bridge).or_insert(true);
    }

    pub fn attached_bridges(&self) -> impl Iterator<Item = &BridgeId> {
        self.attached_bridges.keys()
    }

    pub fn set_designated(&mut self, bridge: &BridgeId, designated: bool) {
        if let Some(flag) = self.attached_bridges.get_mut(bridge) {
            *flag = designated;
        }
    }

    /// Bridges whose port onto this segment is currently Designated
    pub fn designated_bridges(&self) -> Vec<&BridgeId> {
        self.attached_bridges
            .iter()
            .filter(|(_, designated)| **designated)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn add_host(&mut self, host: impl Into<HostId>) {
        self.host_list.push(host.into());
    }

    pub fn hosts(&self) -> &[HostId] {
        &self.host_list
    }

    pub fn has_host(&self, host: &str) -> bool {
        self.host_list.iter().any(|h| h == host)
    }

    pub fn enqueue(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.pending.extend(messages);
    }

    pub fn pending_messages(&self) -> usize {
        self.pending.len()
    }

    /// Broadcast every pending message to each attached bridge except its
    /// sender, then clear the queue. Returns the per-bridge batches and
    /// whether anything was delivered.
    pub fn step(&mut self) -> (BTreeMap<BridgeId, Vec<Message>>, bool) {
        let mut outgoing: BTreeMap<BridgeId, Vec<Message>> = BTreeMap::new();
        let mut produced_any = false;

        for message in std::mem::take(&mut self.pending) {
            for bridge in self.attached_bridges.keys() {
                if *bridge == message.sender {
                    continue;
                }
                outgoing.entry(bridge.clone()).or_default().push(message.clone());
                produced_any = true;
            }
        }

        (outgoing, produced_any)
    }
}
