//! Convergence loop: run rounds until the network goes quiet or the cap is hit.

use serde::Serialize;

use super::topology::Topology;
use super::types::BridgeId;
use crate::trace::TraceObserver;

/// Rounds allowed per bridge before a run is declared unconverged
pub const DEFAULT_ROUND_CAP_FACTOR: usize = 2;

/// Outcome of a convergence run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvergenceReport {
    /// Number of rounds executed
    pub rounds: usize,
    /// False when the round cap was reached without a quiet round
    pub converged: bool,
    /// Bridges that believe themselves root, one per connected component
    pub roots: Vec<BridgeId>,
}

/// Converge with the default cap of two rounds per bridge
pub fn converge(topology: &mut Topology, observer: &mut dyn TraceObserver) -> ConvergenceReport {
    converge_with_cap(topology, DEFAULT_ROUND_CAP_FACTOR, observer)
}

/// Run rounds 0, 1, ... until one is stable, executing at most
/// `round_cap_factor * bridge_count` rounds.
pub fn converge_with_cap(
    topology: &mut Topology,
    round_cap_factor: usize,
    observer: &mut dyn TraceObserver,
) -> ConvergenceReport {
    let cap = round_cap_factor.saturating_mul(topology.bridge_count());
    let mut rounds = 0;
    let mut converged = topology.bridge_count() == 0;

    while rounds < cap {
        let stable = topology.step(rounds, observer);
        rounds += 1;
        if stable {
            converged = true;
            break;
        }
    }

    let roots = topology.roots();
    if converged {
        log::info!("Spanning tree converged after {} rounds (root: {:?})", rounds, roots);
    } else {
        log::warn!(
            "Spanning tree did not converge within {} rounds; reporting roles as they stand",
            cap
        );
    }

    ConvergenceReport { rounds, converged, roots }
}
