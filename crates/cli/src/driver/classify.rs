//! Component stack classification.

use rendergate_core::{
    static_shell_verdict, track_dynamic_access, ComponentStack, DiagnosticError,
    DynamicTrackingState, DynamicValidationState, PreludeState, ShellKind, ShellVerdict,
};
use serde::Serialize;

use crate::error::{CliError, Result};

/// Result of classifying one dynamic access.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyReport {
    pub route: String,
    pub shell: ShellKind,
    pub frames: Vec<String>,
    pub validation: DynamicValidationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<ShellVerdict>,
}

/// Classify an access that happened under `component_stack`.
///
/// `sync_error` stands in for a synchronous access the client render
/// recorded under the same stack. With a `prelude` the resulting state is
/// also judged as a static shell.
pub fn classify(
    route: &str,
    shell: ShellKind,
    component_stack: &str,
    prelude: Option<PreludeState>,
    sync_error: Option<String>,
) -> Result<ClassifyReport> {
    let component_stack = normalize(component_stack);
    let frames: Vec<String> = ComponentStack::parse(&component_stack)
        .frames()
        .iter()
        .map(|frame| frame.name.to_string())
        .collect();
    if frames.is_empty() {
        return Err(CliError::EmptyStack);
    }

    let mut client = DynamicTrackingState::new(false);
    if let Some(message) = sync_error {
        client.record_sync_error(DiagnosticError::with_component_stack(message, &component_stack));
    }

    let mut validation = DynamicValidationState::new();
    track_dynamic_access(shell, route, &component_stack, &mut validation, &client);
    tracing::debug!(route, frames = frames.len(), "classified component stack");

    let verdict = prelude.map(|prelude| static_shell_verdict(route, prelude, &validation, None));

    Ok(ClassifyReport {
        route: route.to_string(),
        shell,
        frames,
        validation,
        verdict,
    })
}

/// Component stacks start with a newline so they can be appended to an
/// error message.
fn normalize(component_stack: &str) -> String {
    let trimmed = component_stack.trim_end();
    if trimmed.starts_with('\n') {
        trimmed.to_string()
    } else {
        format!("\n{trimmed}")
    }
}
