//! Simulation orchestrator.
//!
//! This module drives a whole run: topology construction, spanning tree
//! convergence, then every requested transfer in order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::forwarding::{TransferOutcome, TransferRequest};
use crate::stp::{
    converge_with_cap, BridgeId, ConvergenceReport, HostId, PortAssignment, SegmentName, Topology,
    TopologyDescription, TopologyError, DEFAULT_ROUND_CAP_FACTOR,
};
use crate::trace::TraceObserver;

/// Everything a topology source (text file or YAML config) produces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationInput {
    pub trace: bool,
    pub description: TopologyDescription,
    pub transfers: Vec<TransferRequest>,
}

/// Knobs for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub round_cap_factor: usize,
    pub parallel: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            round_cap_factor: DEFAULT_ROUND_CAP_FACTOR,
            parallel: true,
        }
    }
}

/// Result of a single transfer request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferStatus {
    Completed { outcome: TransferOutcome },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub request: TransferRequest,
    #[serde(flatten)]
    pub status: TransferStatus,
    /// Forwarding tables of all bridges after this transfer
    pub tables_after: BTreeMap<BridgeId, BTreeMap<HostId, SegmentName>>,
}

/// Full result of a simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub convergence: ConvergenceReport,
    pub roles: BTreeMap<BridgeId, Vec<PortAssignment>>,
    pub transfers: Vec<TransferReport>,
}

/// Run the complete simulation.
///
/// Only a malformed topology aborts the run. Non-convergence is reported in
/// the convergence summary and a bad transfer request only fails that transfer.
pub fn run_simulation(
    input: &SimulationInput,
    settings: RunSettings,
    observer: &mut dyn TraceObserver,
) -> Result<SimulationReport, TopologyError> {
    let mut topology = Topology::from_description(&input.description)?.with_parallel(settings.parallel);

    let convergence = converge_with_cap(&mut topology, settings.round_cap_factor, observer);
    let roles = topology.roles();

    let mut transfers = Vec::with_capacity(input.transfers.len());
    for request in &input.transfers {
        let status = match topology.transfer(&request.sender, &request.receiver) {
            Ok(outcome) => TransferStatus::Completed { outcome },
            Err(e) => {
                log::warn!("Transfer {} -> {} failed: {}", request.sender, request.receiver, e);
                TransferStatus::Failed { error: e.to_string() }
            }
        };
        transfers.push(TransferReport {
            request: request.clone(),
            status,
            tables_after: forwarding_tables(&topology),
        });
    }

    Ok(SimulationReport {
        convergence,
        roles,
        transfers,
    })
}

fn forwarding_tables(topology: &Topology) -> BTreeMap<BridgeId, BTreeMap<HostId, SegmentName>> {
    topology
        .bridges()
        .map(|bridge| (bridge.id().clone(), bridge.forwarding_table().clone()))
        .collect()
}
