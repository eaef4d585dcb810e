//! Pretty output formatting.

use rendergate_core::{DiagnosticError, ShellVerdict};

use crate::driver::{ClassifyReport, SimulationReport, WaiterOutcome};

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn format_errors(title: &str, errors: &[DiagnosticError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut output = format!("\n{title} ({})\n", errors.len());
    output.push_str(&"-".repeat(40));
    for error in errors {
        output.push_str(&format!("\n{}", error.message));
    }
    output
}

/// Format a classification for display.
pub fn format_classify(report: &ClassifyReport) -> String {
    let validation = &report.validation;
    let mut output = format!(
        "{} [{:?}]\n  Frames: {}\n  Suspense above body: {}\n  Allowed dynamic: {}\n  Dynamic metadata: {}\n  Dynamic viewport: {}",
        report.route,
        report.shell,
        report.frames.join(" < "),
        flag(validation.has_suspense_above_body),
        flag(validation.has_allowed_dynamic),
        flag(validation.has_dynamic_metadata),
        flag(validation.has_dynamic_viewport),
    );
    if let Some(metadata) = &validation.dynamic_metadata {
        output.push_str(&format!("\n  Metadata error: {}", metadata.message));
    }
    output.push_str(&format_errors("ERRORS", &validation.dynamic_errors));

    match &report.verdict {
        None => {}
        Some(ShellVerdict::Accept) => output.push_str("\nShell: accepted"),
        Some(ShellVerdict::Reject { reason, .. }) => {
            output.push_str(&format!("\nShell: rejected ({reason})"))
        }
    }
    output
}

fn format_waiter(outcome: &WaiterOutcome) -> String {
    match outcome {
        WaiterOutcome::Released => "released".to_string(),
        WaiterOutcome::Rejected { reason } => format!("rejected: {reason}"),
        WaiterOutcome::Waiting => "waiting".to_string(),
    }
}

/// Format a simulation report for display.
pub fn format_simulation(report: &SimulationReport) -> String {
    let mut output = format!(
        "Stage: {}\n  May abandon: {}\n  Aborted: {}",
        report.final_stage,
        flag(report.may_abandon),
        flag(report.aborted),
    );
    if let Some(reason) = &report.static_interrupt_reason {
        output.push_str(&format!("\n  Static stage interrupted by: {reason}"));
    }
    if let Some(reason) = &report.runtime_interrupt_reason {
        output.push_str(&format!("\n  Runtime stage interrupted by: {reason}"));
    }
    output.push_str(&format!(
        "\n  Runtime gate: {:?} (waiter {})\n  Dynamic gate: {:?} (waiter {})",
        report.runtime_gate,
        format_waiter(&report.runtime_waiter),
        report.dynamic_gate,
        format_waiter(&report.dynamic_waiter),
    ));
    let fired: Vec<String> = report
        .listeners_fired
        .iter()
        .map(ToString::to_string)
        .collect();
    output.push_str(&format!("\n  Listeners fired: {}", fired.join(", ")));
    output
}
