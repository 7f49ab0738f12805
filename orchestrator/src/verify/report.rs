//! Fixed-width verification report

use sdwan_models::{CheckOutcome, CommandStatus, PhaseResult, PingOutcome};

use crate::directory::ParameterStore;
use crate::errors::OrchestratorError;

pub const REPORT_TITLE: &str = "SD-WAN Verification Report";

fn check_icon(outcome: CheckOutcome) -> &'static str {
    match outcome {
        CheckOutcome::Ok => "pass",
        CheckOutcome::NotApplicable => "n/a",
        CheckOutcome::Fail => "FAIL",
    }
}

fn ping_icon(outcome: PingOutcome) -> &'static str {
    match outcome {
        PingOutcome::Ok => "pass",
        PingOutcome::Fail | PingOutcome::Unknown => "FAIL",
    }
}

/// Render one line per router plus a trailing `Result: s/t routers passed`
pub fn format_report(result: &PhaseResult) -> String {
    let mut lines = vec![REPORT_TITLE.to_string(), "=".repeat(50), String::new()];

    for (router, outcome) in &result.results {
        let details = match (&outcome.details, outcome.result.status.is_success()) {
            (Some(details), true) => details,
            _ => {
                let why = match outcome.result.status {
                    CommandStatus::TimedOut => "command timed out",
                    _ => "command failed",
                };
                lines.push(format!("  {:<14} FAIL - {}", router, why));
                continue;
            }
        };

        let mut checks = vec![
            format!("IPsec={}", check_icon(details.tunnel)),
            format!("BGP={}", check_icon(details.peering)),
            format!("Interfaces={}", check_icon(details.interfaces)),
            format!("CloudWAN-BGP={}", check_icon(details.cloud_peering)),
        ];
        checks.extend(
            details
                .ping
                .iter()
                .map(|(ip, outcome)| format!("Ping({})={}", ip, ping_icon(*outcome))),
        );

        lines.push(format!("  {:<14} {}", router, checks.join("  ")));
    }

    lines.push(String::new());
    lines.push(format!(
        "Result: {}/{} routers passed",
        result.success_count,
        result.total()
    ));
    lines.join("\n")
}

/// Write the rendered report under `name`, replacing any previous report.
///
/// The caller decides what a failure means; the orchestrator only logs it.
pub async fn persist_report(
    store: &dyn ParameterStore,
    region: &str,
    name: &str,
    report: &str,
) -> Result<(), OrchestratorError> {
    store.put(region, name, report, true).await
}
