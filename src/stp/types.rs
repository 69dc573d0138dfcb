//! Core data types for the spanning tree simulation.
//!
//! This file holds the identifier types, the configuration vector used for
//! every ordering decision, the BPDU message and the port roles.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a LAN segment. A bridge port carries the name of the segment it attaches to.
pub type SegmentName = String;

/// Identifier of an end host living on a segment
pub type HostId = String;

/// Bridge identifier with natural ordering.
///
/// Ids are compared by their alphabetic prefix, then by their trailing
/// decimal number, then lexically, so `B2 < B10` while remaining a total order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeId(String);

impl BridgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split "B12" into ("B", Some(12)). Ids without a parseable numeric tail have no number.
    fn sort_key(&self) -> (&str, Option<u64>) {
        let digits = self.0.chars().rev().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return (&self.0, None);
        }
        let (prefix, number) = self.0.split_at(self.0.len() - digits);
        match number.parse::<u64>() {
            Ok(n) => (prefix, Some(n)),
            Err(_) => (&self.0, None),
        }
    }
}

impl Ord for BridgeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for BridgeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BridgeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The (root, distance, bridge) triple behind root election and port roles.
///
/// Field order matters: the derived `Ord` is the protocol's priority order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vector {
    pub root: BridgeId,
    pub distance: u32,
    pub bridge: BridgeId,
}

impl Vector {
    pub fn new(root: BridgeId, distance: u32, bridge: BridgeId) -> Self {
        Self { root, distance, bridge }
    }

    /// The vector every bridge starts with: "I am the root, at distance 0"
    pub fn own(id: &BridgeId) -> Self {
        Self::new(id.clone(), 0, id.clone())
    }

    /// Returns true if `self` should replace `current`.
    ///
    /// Smaller root wins, then smaller distance, then a sender id smaller than
    /// `tie_break`. A candidate from the `tie_break` bridge itself never wins a
    /// full tie, so re-announcements from the same sender cause no churn.
    pub fn supersedes(&self, current: &Vector, tie_break: &BridgeId) -> bool {
        match self.root.cmp(&current.root) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => match self.distance.cmp(&current.distance) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => self.bridge < *tie_break,
            },
        }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.root, self.distance, self.bridge)
    }
}

/// A configuration BPDU as it travels across one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: BridgeId,
    pub root: BridgeId,
    pub distance: u32,
    /// Port (and therefore segment) the message was sent from or arrived on
    pub port: SegmentName,
}

impl Message {
    /// Build the message a bridge sends to advertise `vector` on `port`
    pub fn advertise(vector: &Vector, port: &str) -> Self {
        Self {
            sender: vector.bridge.clone(),
            root: vector.root.clone(),
            distance: vector.distance,
            port: port.to_string(),
        }
    }

    pub fn vector(&self) -> Vector {
        Vector::new(self.root.clone(), self.distance, self.sender.clone())
    }

    /// The same message one hop further from the root
    pub fn hop(&self) -> Self {
        Self {
            distance: self.distance + 1,
            ..self.clone()
        }
    }
}

/// Role of a bridge port once the spanning tree has been computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortRole {
    /// Best path to the root for the segment; forwards onto it
    #[serde(rename = "DP")]
    Designated,
    /// The single port towards the root
    #[serde(rename = "RP")]
    Root,
    /// Neither; excluded from forwarding to break loops
    #[serde(rename = "NP")]
    Blocked,
}

impl PortRole {
    pub fn is_forwarding(&self) -> bool {
        !matches!(self, PortRole::Blocked)
    }
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRole::Designated => write!(f, "DP"),
            PortRole::Root => write!(f, "RP"),
            PortRole::Blocked => write!(f, "NP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(root: &str, distance: u32, bridge: &str) -> Vector {
        Vector::new(root.into(), distance, bridge.into())
    }

    #[test]
    fn test_bridge_id_natural_order() {
        let mut ids: Vec<BridgeId> = ["B10", "B2", "B1", "A7", "B"].iter().map(|s| BridgeId::from(*s)).collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(sorted, vec!["A7", "B", "B1", "B2", "B10"]);
    }

    #[test]
    fn test_bridge_id_leading_zeros_are_distinct() {
        let a = BridgeId::from("B01");
        let b = BridgeId::from("B1");
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_supersedes_root_dominates() {
        assert!(v("B1", 9, "B9").supersedes(&v("B2", 0, "B2"), &"B2".into()));
        assert!(!v("B3", 0, "B1").supersedes(&v("B2", 5, "B5"), &"B5".into()));
    }

    #[test]
    fn test_supersedes_distance_then_tie_break() {
        let current = v("B1", 2, "B4");
        assert!(v("B1", 1, "B9").supersedes(&current, &"B4".into()));
        assert!(!v("B1", 3, "B2").supersedes(&current, &"B4".into()));
        assert!(v("B1", 2, "B3").supersedes(&current, &"B4".into()));
        assert!(!v("B1", 2, "B5").supersedes(&current, &"B4".into()));
    }

    #[test]
    fn test_same_sender_never_wins_tie() {
        let current = v("B1", 2, "B4");
        assert!(!current.clone().supersedes(&current, &"B4".into()));
    }

    #[test]
    fn test_message_hop_and_vector() {
        let msg = Message::advertise(&v("B1", 0, "B1"), "A");
        let hopped = msg.hop();
        assert_eq!(hopped.distance, 1);
        assert_eq!(hopped.vector(), v("B1", 1, "B1"));
        assert_eq!(msg.distance, 0);
        assert_eq!(format!("{}", hopped.vector()), "(B1 1 B1)");
    }

    #[test]
    fn test_port_role_display() {
        assert_eq!(PortRole::Designated.to_string(), "DP");
        assert_eq!(PortRole::Root.to_string(), "RP");
        assert_eq!(PortRole::Blocked.to_string(), "NP");
        assert!(!PortRole::Blocked.is_forwarding());
    }
}
