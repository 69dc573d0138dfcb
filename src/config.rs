use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::forwarding::TransferRequest;
use crate::orchestrator::{RunSettings, SimulationInput};
use crate::stp::{BridgeSpec, HostId, SegmentName, TopologyDescription, DEFAULT_ROUND_CAP_FACTOR};

/// YAML simulation configuration
///
/// ```yaml
/// general:
///   trace: true
///   round_cap_factor: 2
/// bridges:
///   - id: B1
///     ports: [A, B]
/// segments:
///   A: [H1, H2]
///   B: [H3]
/// transfers:
///   - sender: H1
///     receiver: H3
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub bridges: Vec<BridgeSpec>,
    #[serde(default)]
    pub segments: BTreeMap<SegmentName, Vec<HostId>>,
    #[serde(default)]
    pub transfers: Vec<TransferRequest>,
}

/// Shared general configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Emit per-round protocol trace lines
    pub trace: bool,
    /// Round cap is this factor times the number of bridges
    pub round_cap_factor: usize,
    /// Evaluate bridges of a round on the thread pool
    pub parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            round_cap_factor: DEFAULT_ROUND_CAP_FACTOR,
            parallel: true,
            log_level: Some("info".to_string()),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid bridge configuration: {0}")]
    InvalidBridge(String),
    #[error("Invalid transfer configuration: {0}")]
    InvalidTransfer(String),
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.round_cap_factor == 0 {
            return Err(ValidationError::InvalidGeneral(
                "round_cap_factor must be at least 1".to_string(),
            ));
        }

        if self.bridges.is_empty() {
            return Err(ValidationError::InvalidBridge(
                "at least one bridge is required".to_string(),
            ));
        }

        for bridge in &self.bridges {
            if bridge.ports.is_empty() {
                return Err(ValidationError::InvalidBridge(format!(
                    "bridge {} has no ports",
                    bridge.id
                )));
            }
        }

        for transfer in &self.transfers {
            if transfer.sender.is_empty() || transfer.receiver.is_empty() {
                return Err(ValidationError::InvalidTransfer(
                    "sender and receiver must both be set".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            round_cap_factor: self.general.round_cap_factor,
            parallel: self.general.parallel,
        }
    }

    pub fn to_input(&self) -> SimulationInput {
        SimulationInput {
            trace: self.general.trace,
            description: TopologyDescription {
                bridges: self.bridges.clone(),
                segments: self.segments.clone(),
            },
            transfers: self.transfers.clone(),
        }
    }
}
