//! Classification of dynamic holes and the static shell verdict.
//!
//! As a render visits the tree, every dynamic access is classified by the
//! component stack it happened under and folded into a
//! [`DynamicValidationState`]. Once the render is done the state is judged
//! by [`static_shell_verdict`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component_stack::{Boundary, ComponentStack};
use crate::error::DiagnosticError;
use crate::stage::PreludeState;
use crate::tracking::DynamicTrackingState;

/// Aggregate used by the shell validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicValidationState {
    pub has_suspense_above_body: bool,
    pub has_dynamic_metadata: bool,
    pub has_dynamic_viewport: bool,
    pub has_allowed_dynamic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_metadata: Option<DiagnosticError>,
    pub dynamic_errors: Vec<DiagnosticError>,
}

impl DynamicValidationState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Which validation pass is classifying an access.
///
/// Each pass reports with its own wording. The runtime shell also treats
/// dynamic metadata as an ordinary error rather than setting it aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// Accesses observed while checking which dynamic usage is allowed.
    Allowed,
    /// Holes in a shell prerendered with runtime data available.
    Runtime,
    /// Holes in the fully static shell.
    Static,
}

impl ShellKind {
    fn sets_metadata_aside(self) -> bool {
        !matches!(self, Self::Runtime)
    }

    fn metadata_message(self, route: &str) -> String {
        match self {
            Self::Allowed | Self::Static => format!(
                "Route \"{route}\": Uncached data or `connection()` was accessed inside metadata \
                 generation. Except for this instance, the page would have been entirely \
                 prerenderable which may have been the intended behavior."
            ),
            Self::Runtime => format!(
                "Route \"{route}\": Runtime data such as `cookies()`, `headers()`, `params`, or \
                 `searchParams` was accessed inside metadata generation. Metadata that depends \
                 on runtime data cannot be part of the runtime shell."
            ),
        }
    }

    fn viewport_message(self, route: &str) -> String {
        match self {
            Self::Allowed | Self::Static => format!(
                "Route \"{route}\": Uncached data or `connection()` was accessed inside viewport \
                 generation. This delays the entire page from rendering, resulting in a slow \
                 user experience."
            ),
            Self::Runtime => format!(
                "Route \"{route}\": Runtime data such as `cookies()`, `headers()`, `params`, or \
                 `searchParams` was accessed inside viewport generation. This delays the entire \
                 page from rendering, resulting in a slow user experience."
            ),
        }
    }

    fn outside_suspense_message(self, route: &str) -> String {
        match self {
            Self::Allowed => format!(
                "Route \"{route}\": Uncached data was accessed outside of <Suspense>. This delays \
                 the entire page from rendering, resulting in a slow user experience."
            ),
            Self::Runtime => format!(
                "Route \"{route}\": Runtime data was accessed outside of <Suspense>. Wrap the \
                 component in a <Suspense> boundary or move the access into a cached scope."
            ),
            Self::Static => format!(
                "Route \"{route}\": Uncached data or runtime data was accessed outside of \
                 <Suspense>, so the static shell cannot be completed. Wrap the component in a \
                 <Suspense> boundary."
            ),
        }
    }
}

/// Classify one dynamic access and fold it into `validation`.
///
/// First match wins: outlet (ignored), metadata, viewport, `Suspense` above
/// the body (explicit opt-in to an empty shell), any `Suspense`, the
/// recorded synchronous access error, and finally a generic error.
pub fn track_dynamic_access(
    kind: ShellKind,
    route: &str,
    component_stack: &str,
    validation: &mut DynamicValidationState,
    client_dynamic: &DynamicTrackingState,
) {
    let stack = ComponentStack::parse(component_stack);

    if stack.contains(Boundary::Outlet) {
        return;
    }

    if stack.contains(Boundary::Metadata) {
        let error =
            DiagnosticError::with_component_stack(kind.metadata_message(route), component_stack);
        validation.has_dynamic_metadata = true;
        if kind.sets_metadata_aside() {
            validation.dynamic_metadata = Some(error);
        } else {
            validation.dynamic_errors.push(error);
        }
        return;
    }

    if stack.contains(Boundary::Viewport) {
        let error =
            DiagnosticError::with_component_stack(kind.viewport_message(route), component_stack);
        validation.has_dynamic_viewport = true;
        validation.dynamic_errors.push(error);
        return;
    }

    if stack.has_suspense_above_body() {
        validation.has_allowed_dynamic = true;
        validation.has_suspense_above_body = true;
        return;
    }

    if stack.contains(Boundary::Suspense) {
        validation.has_allowed_dynamic = true;
        return;
    }

    if let Some(sync_error) = &client_dynamic.sync_dynamic_error_with_stack {
        validation.dynamic_errors.push(sync_error.clone());
        return;
    }

    validation
        .dynamic_errors
        .push(DiagnosticError::with_component_stack(
            kind.outside_suspense_message(route),
            component_stack,
        ));
}

pub fn track_allowed_dynamic_access(
    route: &str,
    component_stack: &str,
    validation: &mut DynamicValidationState,
    client_dynamic: &DynamicTrackingState,
) {
    track_dynamic_access(
        ShellKind::Allowed,
        route,
        component_stack,
        validation,
        client_dynamic,
    );
}

pub fn track_dynamic_hole_in_runtime_shell(
    route: &str,
    component_stack: &str,
    validation: &mut DynamicValidationState,
    client_dynamic: &DynamicTrackingState,
) {
    track_dynamic_access(
        ShellKind::Runtime,
        route,
        component_stack,
        validation,
        client_dynamic,
    );
}

pub fn track_dynamic_hole_in_static_shell(
    route: &str,
    component_stack: &str,
    validation: &mut DynamicValidationState,
    client_dynamic: &DynamicTrackingState,
) {
    track_dynamic_access(
        ShellKind::Static,
        route,
        component_stack,
        validation,
        client_dynamic,
    );
}

/// Why a static shell was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    SyncDynamicAccess,
    DisallowedDynamic,
    MissingShell,
    DynamicViewport,
    DynamicMetadata,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SyncDynamicAccess => "sync-dynamic-access",
            Self::DisallowedDynamic => "disallowed-dynamic",
            Self::MissingShell => "missing-shell",
            Self::DynamicViewport => "dynamic-viewport",
            Self::DynamicMetadata => "dynamic-metadata",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of judging a finished prerender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum ShellVerdict {
    Accept,
    Reject {
        reason: RejectReason,
        errors: Vec<DiagnosticError>,
    },
}

impl ShellVerdict {
    fn reject(reason: RejectReason, errors: Vec<DiagnosticError>) -> Self {
        Self::Reject { reason, errors }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }

    /// Diagnostics explaining the rejection (empty when accepted).
    pub fn into_errors(self) -> Vec<DiagnosticError> {
        match self {
            Self::Accept => Vec::new(),
            Self::Reject { errors, .. } => errors,
        }
    }
}

/// Decide whether a prerender's static shell is acceptable.
///
/// A recorded synchronous dynamic access is fatal on its own. Otherwise an
/// incomplete prelude is accepted only with a `Suspense` boundary above the
/// body, and a full prelude is rejected for dynamic viewport, or for
/// dynamic metadata when nothing else on the page was dynamic.
pub fn static_shell_verdict(
    route: &str,
    prelude: PreludeState,
    validation: &DynamicValidationState,
    sync_error: Option<&DiagnosticError>,
) -> ShellVerdict {
    if let Some(error) = sync_error {
        return ShellVerdict::reject(RejectReason::SyncDynamicAccess, vec![error.clone()]);
    }

    if prelude != PreludeState::Full {
        if validation.has_suspense_above_body {
            return ShellVerdict::Accept;
        }
        if !validation.dynamic_errors.is_empty() {
            return ShellVerdict::reject(
                RejectReason::DisallowedDynamic,
                validation.dynamic_errors.clone(),
            );
        }
        if prelude == PreludeState::Empty {
            return ShellVerdict::reject(
                RejectReason::MissingShell,
                vec![DiagnosticError::new(format!(
                    "Route \"{route}\" did not produce a static shell and no reason could be \
                     determined. This is a bug, please file an issue."
                ))],
            );
        }
        return ShellVerdict::Accept;
    }

    if validation.has_dynamic_viewport && !validation.has_suspense_above_body {
        let mut errors = validation.dynamic_errors.clone();
        if errors.is_empty() {
            errors.push(DiagnosticError::new(format!(
                "Route \"{route}\" has a viewport that depends on uncached or runtime data. \
                 The viewport must be known before the page can start rendering."
            )));
        }
        return ShellVerdict::reject(RejectReason::DynamicViewport, errors);
    }

    if validation.has_dynamic_metadata && !validation.has_allowed_dynamic {
        let error = validation.dynamic_metadata.clone().unwrap_or_else(|| {
            DiagnosticError::new(format!(
                "Route \"{route}\" has metadata that depends on request data or uncached \
                 fetches when the rest of the route does not."
            ))
        });
        return ShellVerdict::reject(RejectReason::DynamicMetadata, vec![error]);
    }

    ShellVerdict::Accept
}

/// Reasons the static shell of a route is not acceptable (empty when it is).
pub fn get_static_shell_disallowed_dynamic_reasons(
    route: &str,
    prelude: PreludeState,
    validation: &DynamicValidationState,
) -> Vec<DiagnosticError> {
    static_shell_verdict(route, prelude, validation, None).into_errors()
}
