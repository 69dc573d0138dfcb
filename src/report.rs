//! Report generation for simulation runs.
//!
//! Generates both the plain text report and a JSON report.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};

use crate::orchestrator::SimulationReport;
use crate::stp::PortAssignment;

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// One line per bridge: `B1: A-DP B-RP`
pub fn render_roles(report: &SimulationReport) -> Vec<String> {
    report
        .roles
        .iter()
        .map(|(bridge, assignments)| {
            let ports: Vec<String> = assignments.iter().map(render_assignment).collect();
            format!("{}: {}", bridge, ports.join(" "))
        })
        .collect()
}

fn render_assignment(assignment: &PortAssignment) -> String {
    format!("{}-{}", assignment.port, assignment.role)
}

/// Forwarding tables of all bridges after each transfer, separated by a blank line
pub fn render_forwarding_tables(report: &SimulationReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (index, transfer) in report.transfers.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        for (bridge, table) in &transfer.tables_after {
            lines.push(format!("{}:", bridge));
            lines.push("HOST ID | FORWARDING PORT".to_string());
            for (host, port) in table {
                lines.push(format!("{} | {}", host, port));
            }
        }
    }

    lines
}

/// Generate the human-readable text report
pub fn generate_text_report(report: &SimulationReport) -> String {
    let mut lines = render_roles(report);
    lines.extend(render_forwarding_tables(report));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Generate the JSON report
pub fn generate_json_report(report: &SimulationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}

pub fn render(report: &SimulationReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Json => generate_json_report(report),
    }
}

/// Write the rendered report to `output_path`
pub fn write_report(report: &SimulationReport, format: ReportFormat, output_path: &Path) -> Result<()> {
    let content = render(report, format)?;
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    log::info!("Report written to {}", output_path.display());
    Ok(())
}
