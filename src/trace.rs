//! Per-round protocol trace.
//!
//! The simulation core reports structured events to a [`TraceObserver`];
//! turning them into text lines is done by [`format_event`] for the CLI.

use serde::Serialize;

use crate::stp::{BridgeId, Vector};

/// What happened to a BPDU at a bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceKind {
    /// The bridge put a message on one of its ports
    Sent,
    /// The bridge took a message out of its inbox
    Received,
    /// The bridge adopted a new best vector
    Adopted,
}

impl TraceKind {
    fn code(&self) -> &'static str {
        match self {
            TraceKind::Sent => "s",
            TraceKind::Received => "r",
            TraceKind::Adopted => "u",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    pub round: usize,
    pub bridge: BridgeId,
    pub kind: TraceKind,
    /// Vector carried by the message (root, distance, sender)
    pub vector: Vector,
}

/// Observer hook invoked by the round scheduler after each phase
pub trait TraceObserver {
    fn on_event(&mut self, event: &TraceEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TraceObserver for NullObserver {
    fn on_event(&mut self, _event: &TraceEvent) {}
}

/// Keeps every event in arrival order
#[derive(Debug, Default, Clone)]
pub struct TraceRecorder {
    pub events: Vec<TraceEvent>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered trace lines, in arrival order
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(format_event).collect()
    }
}

impl TraceObserver for TraceRecorder {
    fn on_event(&mut self, event: &TraceEvent) {
        self.events.push(event.clone());
    }
}

impl<F> TraceObserver for F
where
    F: FnMut(&TraceEvent),
{
    fn on_event(&mut self, event: &TraceEvent) {
        self(event)
    }
}

/// Render an event as `<round> <s|r|u> <bridge> (<root> <distance> <sender>)`
pub fn format_event(event: &TraceEvent) -> String {
    format!("{} {} {} {}", event.round, event.kind.code(), event.bridge, event.vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_event() {
        let event = TraceEvent {
            round: 3,
            bridge: "B2".into(),
            kind: TraceKind::Received,
            vector: Vector::new("B1".into(), 0, "B1".into()),
        };
        assert_eq!(format_event(&event), "3 r B2 (B1 0 B1)");
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = 0;
        {
            let mut observer = |_: &TraceEvent| seen += 1;
            let event = TraceEvent {
                round: 0,
                bridge: "B1".into(),
                kind: TraceKind::Sent,
                vector: Vector::own(&"B1".into()),
            };
            observer.on_event(&event);
            observer.on_event(&event);
        }
        assert_eq!(seen, 2);
    }
}
