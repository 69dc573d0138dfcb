//! Topology construction and the synchronous round scheduler.

use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::bridge::{Bridge, BridgeOutput, PortAssignment};
use super::segment::Segment;
use super::types::{BridgeId, HostId, Message, PortRole, SegmentName};
use crate::trace::TraceObserver;

/// One bridge as declared by the topology source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSpec {
    pub id: BridgeId,
    pub ports: Vec<SegmentName>,
}

impl BridgeSpec {
    pub fn new<S: Into<SegmentName>>(id: &str, ports: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: BridgeId::new(id),
            ports: ports.into_iter().map(Into::into).collect(),
        }
    }
}

/// Structured topology handed over by a parser or a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescription {
    pub bridges: Vec<BridgeSpec>,
    /// Declared segments and the hosts attached to each. When empty, segments
    /// are derived from port names alone.
    #[serde(default)]
    pub segments: BTreeMap<SegmentName, Vec<HostId>>,
}

/// Reasons a topology description is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("Bridge id cannot be empty")]
    EmptyBridgeId,

    #[error("Duplicate bridge id: {0}")]
    DuplicateBridge(BridgeId),

    #[error("Bridge {bridge} lists port {port} more than once")]
    DuplicatePort { bridge: BridgeId, port: SegmentName },

    #[error("Bridge {bridge} has port {port} which references no declared segment")]
    UnknownSegment { bridge: BridgeId, port: SegmentName },

    #[error("Host {host} is attached to both segment {first} and segment {second}")]
    HostOnMultipleSegments {
        host: HostId,
        first: SegmentName,
        second: SegmentName,
    },
}

/// The bridged LAN: every bridge and segment, advanced in lock-step rounds
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) bridges: BTreeMap<BridgeId, Bridge>,
    pub(crate) segments: BTreeMap<SegmentName, Segment>,
    parallel: bool,
}

impl Topology {
    /// Build and validate a topology. Segments are linked to bridges through
    /// shared port names.
    pub fn from_description(description: &TopologyDescription) -> Result<Self, TopologyError> {
        let declared = !description.segments.is_empty();
        let mut segments: BTreeMap<SegmentName, Segment> = BTreeMap::new();
        let mut host_home: HashMap<&str, &str> = HashMap::new();

        for (name, hosts) in &description.segments {
            let mut segment = Segment::new(name.clone());
            for host in hosts {
                match host_home.get(host.as_str()) {
                    Some(first) if *first != name.as_str() => {
                        return Err(TopologyError::HostOnMultipleSegments {
                            host: host.clone(),
                            first: first.to_string(),
                            second: name.clone(),
                        });
                    }
                    Some(_) => continue,
                    None => {
                        host_home.insert(host, name);
                        segment.add_host(host.clone());
                    }
                }
            }
            segments.insert(name.clone(), segment);
        }

        let mut bridges = BTreeMap::new();
        for spec in &description.bridges {
            if spec.id.as_str().is_empty() {
                return Err(TopologyError::EmptyBridgeId);
            }
            if bridges.contains_key(&spec.id) {
                return Err(TopologyError::DuplicateBridge(spec.id.clone()));
            }

            let mut seen = HashSet::new();
            for port in &spec.ports {
                if !seen.insert(port.as_str()) {
                    return Err(TopologyError::DuplicatePort {
                        bridge: spec.id.clone(),
                        port: port.clone(),
                    });
                }
                if declared && !segments.contains_key(port) {
                    return Err(TopologyError::UnknownSegment {
                        bridge: spec.id.clone(),
                        port: port.clone(),
                    });
                }
                segments
                    .entry(port.clone())
                    .or_insert_with(|| Segment::new(port.clone()))
                    .attach(spec.id.clone());
            }

            bridges.insert(spec.id.clone(), Bridge::new(spec.id.clone(), spec.ports.iter().cloned()));
        }

        log::info!(
            "Built topology with {} bridges and {} segments",
            bridges.len(),
            segments.len()
        );

        Ok(Self {
            bridges,
            segments,
            parallel: true,
        })
    }

    /// Evaluate the bridge phase on the rayon pool (default) or sequentially
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    pub fn bridges(&self) -> impl Iterator<Item = &Bridge> {
        self.bridges.values()
    }

    pub fn bridge(&self, id: &str) -> Option<&Bridge> {
        self.bridges.get(&BridgeId::new(id))
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }

    /// Segment on which `host` lives, if any
    pub fn segment_of_host(&self, host: &str) -> Option<&Segment> {
        self.segments.values().find(|segment| segment.has_host(host))
    }

    /// Port roles of every bridge, in bridge then port order
    pub fn roles(&self) -> BTreeMap<BridgeId, Vec<PortAssignment>> {
        self.bridges
            .iter()
            .map(|(id, bridge)| (id.clone(), bridge.roles()))
            .collect()
    }

    /// Bridges that currently believe themselves root
    pub fn roots(&self) -> Vec<BridgeId> {
        self.bridges
            .values()
            .filter(|bridge| bridge.is_root())
            .map(|bridge| bridge.id().clone())
            .collect()
    }

    /// Advance every bridge and segment by one round. Returns true when the
    /// round produced no message at all.
    ///
    /// All bridges finish before any segment runs, and all segments finish
    /// before any bridge inbox is filled.
    pub fn step(&mut self, round: usize, observer: &mut dyn TraceObserver) -> bool {
        let outputs: Vec<BridgeOutput> = if self.parallel {
            let mut bridges: Vec<&mut Bridge> = self.bridges.values_mut().collect();
            bridges.par_iter_mut().map(|bridge| bridge.step(round)).collect()
        } else {
            self.bridges.values_mut().map(|bridge| bridge.step(round)).collect()
        };

        let mut bridges_produced = false;
        for output in outputs {
            bridges_produced |= output.produced();
            for event in &output.events {
                observer.on_event(event);
            }
            for (port, batch) in output.batches {
                match self.segments.get_mut(&port) {
                    Some(segment) => segment.enqueue(batch),
                    None => log::warn!("Dropping {} messages for unknown segment {}", batch.len(), port),
                }
            }
        }

        let mut segment_outputs: Vec<BTreeMap<BridgeId, Vec<Message>>> = Vec::with_capacity(self.segments.len());
        let mut segments_produced = false;
        for segment in self.segments.values_mut() {
            let (batches, produced) = segment.step();
            segments_produced |= produced;
            segment_outputs.push(batches);
        }

        for batches in segment_outputs {
            for (id, messages) in batches {
                if let Some(bridge) = self.bridges.get_mut(&id) {
                    bridge.deliver(messages);
                }
            }
        }

        self.sync_designated_flags();

        log::debug!(
            "Round {}: bridges produced={}, segments produced={}",
            round, bridges_produced, segments_produced
        );

        !bridges_produced && !segments_produced
    }

    fn sync_designated_flags(&mut self) {
        for bridge in self.bridges.values() {
            for assignment in bridge.roles() {
                if let Some(segment) = self.segments.get_mut(&assignment.port) {
                    segment.set_designated(bridge.id(), assignment.role == PortRole::Designated);
                }
            }
        }
    }
}
