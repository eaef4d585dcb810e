//! Postpone reasons and the typed suspend-for-dynamic signal.
//!
//! A postpone cooperatively suspends one subtree of a render while the rest
//! of the render completes. Inside this workspace the signal travels as a
//! typed [`DynamicPostpone`] value. The string form exists for hosts that
//! only hand back a message, and [`is_dynamic_postpone_reason`] recognises it.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::InvariantError;

const BAILOUT_MARKER: &str = "needs to bail out of prerendering at this point because it used";
const UNCATCHABLE_MARKER: &str = "It should not be caught by your own try/catch.";

/// Build the reason string handed to the host's postpone primitive.
pub fn create_postpone_reason(route: &str, expression: &str) -> String {
    format!(
        "Route {route} {BAILOUT_MARKER} {expression}. The renderer throws this special \
         signal to indicate where. {UNCATCHABLE_MARKER}"
    )
}

/// Whether `reason` was produced by [`create_postpone_reason`].
///
/// Both markers must be present; a message carrying only one of them is an
/// ordinary error.
pub fn is_dynamic_postpone_reason(reason: &str) -> bool {
    reason.contains(BAILOUT_MARKER) && reason.contains(UNCATCHABLE_MARKER)
}

/// Checks once per process that the reason classifier recognises its own
/// output.
pub fn verify_postpone_classifier() -> Result<(), InvariantError> {
    static CLASSIFIER_OK: OnceLock<bool> = OnceLock::new();

    let ok = *CLASSIFIER_OK
        .get_or_init(|| is_dynamic_postpone_reason(&create_postpone_reason("%%%", "^^^")));
    if ok {
        Ok(())
    } else {
        Err(InvariantError::new(
            "is_dynamic_postpone_reason misidentified a postpone reason.",
        ))
    }
}

/// Suspend the current subtree because `expression` needs dynamic data.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", create_postpone_reason(.route, .expression))]
pub struct DynamicPostpone {
    pub route: String,
    pub expression: String,
}

impl DynamicPostpone {
    pub fn new(route: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            expression: expression.into(),
        }
    }

    /// The string form of this postpone.
    pub fn reason(&self) -> String {
        create_postpone_reason(&self.route, &self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_recognises_own_reasons() {
        for (route, expression) in [
            ("/", "`cookies()`"),
            ("/blog/[slug]", "`headers()`"),
            ("", ""),
            ("/a b", "searchParams.foo"),
        ] {
            assert!(is_dynamic_postpone_reason(&create_postpone_reason(
                route, expression
            )));
        }
    }

    #[test]
    fn test_classifier_rejects_single_marker() {
        assert!(!is_dynamic_postpone_reason(&format!(
            "Route / {BAILOUT_MARKER} cookies()"
        )));
        assert!(!is_dynamic_postpone_reason(UNCATCHABLE_MARKER));
        assert!(!is_dynamic_postpone_reason("something else went wrong"));
    }

    #[test]
    fn test_verify_classifier() {
        assert!(verify_postpone_classifier().is_ok());
    }

    #[test]
    fn test_typed_postpone_displays_reason() {
        let postpone = DynamicPostpone::new("/dashboard", "`connection()`");
        assert_eq!(postpone.to_string(), postpone.reason());
        assert!(is_dynamic_postpone_reason(&postpone.to_string()));
    }
}
