//! Structured view of a component stack.
//!
//! A component stack lists the components active when something happened,
//! innermost first, one `at Name (location)` frame per line. The validation
//! pass only cares about a handful of boundary components and about where
//! `Suspense` sits relative to the document body.

/// Wraps the page outlet. Accesses under it are judged by their siblings.
pub const OUTLET_BOUNDARY_NAME: &str = "__next_outlet_boundary__";
/// Wraps metadata generation.
pub const METADATA_BOUNDARY_NAME: &str = "__next_metadata_boundary__";
/// Wraps viewport generation.
pub const VIEWPORT_BOUNDARY_NAME: &str = "__next_viewport_boundary__";
/// Wraps the root layout.
pub const ROOT_LAYOUT_BOUNDARY_NAME: &str = "__next_root_layout_boundary__";

const SUSPENSE_NAME: &str = "Suspense";

/// Host tags that are, or imply, the document body.
const BODY_AND_IMPLICIT_TAGS: &[&str] = &[
    "body", "div", "main", "section", "article", "aside", "header", "footer", "nav", "form", "p",
    "span", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// What a frame means to the validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Outlet,
    Metadata,
    Viewport,
    RootLayout,
    Suspense,
    Body,
    Component,
}

impl Boundary {
    fn of(name: &str) -> Self {
        match name {
            OUTLET_BOUNDARY_NAME => Self::Outlet,
            METADATA_BOUNDARY_NAME => Self::Metadata,
            VIEWPORT_BOUNDARY_NAME => Self::Viewport,
            ROOT_LAYOUT_BOUNDARY_NAME => Self::RootLayout,
            SUSPENSE_NAME => Self::Suspense,
            tag if BODY_AND_IMPLICIT_TAGS.contains(&tag) => Self::Body,
            _ => Self::Component,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub name: &'a str,
    pub boundary: Boundary,
}

/// Parsed frames of a component stack, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentStack<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> ComponentStack<'a> {
    /// Parse `at Name (...)` lines. Lines that are not frames are skipped.
    pub fn parse(stack: &'a str) -> Self {
        let frames = stack
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix("at "))
            .filter_map(|rest| rest.split_whitespace().next())
            .map(|name| Frame {
                name,
                boundary: Boundary::of(name),
            })
            .collect();
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame<'a>] {
        &self.frames
    }

    pub fn contains(&self, boundary: Boundary) -> bool {
        self.frames.iter().any(|frame| frame.boundary == boundary)
    }

    /// A `Suspense` boundary that wraps the document body: walking outward
    /// from it reaches the root layout before any body or implicit-body tag.
    pub fn has_suspense_above_body(&self) -> bool {
        self.frames.iter().enumerate().any(|(i, frame)| {
            frame.boundary == Boundary::Suspense
                && self.frames[i + 1..]
                    .iter()
                    .map(|outer| outer.boundary)
                    .find(|b| matches!(b, Boundary::Body | Boundary::RootLayout))
                    == Some(Boundary::RootLayout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(names: &[&str]) -> String {
        names
            .iter()
            .map(|name| format!("\n    at {name} (<anonymous>)"))
            .collect()
    }

    #[test]
    fn test_parse_frames() {
        let raw = stack(&["Page", "Suspense", "body"]);
        let parsed = ComponentStack::parse(&raw);
        let names: Vec<_> = parsed.frames().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Page", "Suspense", "body"]);
        assert_eq!(parsed.frames()[1].boundary, Boundary::Suspense);
        assert_eq!(parsed.frames()[2].boundary, Boundary::Body);
    }

    #[test]
    fn test_parse_skips_non_frames() {
        let raw = "Error: boom\n    at Page (app/page.tsx:3:5)\nnot a frame";
        let parsed = ComponentStack::parse(raw);
        assert_eq!(parsed.frames().len(), 1);
        assert_eq!(parsed.frames()[0].name, "Page");
    }

    #[test]
    fn test_boundary_markers() {
        let raw = stack(&["Title", METADATA_BOUNDARY_NAME, "Layout"]);
        let parsed = ComponentStack::parse(&raw);
        assert!(parsed.contains(Boundary::Metadata));
        assert!(!parsed.contains(Boundary::Viewport));
        assert!(!parsed.contains(Boundary::Outlet));
    }

    #[test]
    fn test_marker_needs_exact_name() {
        let raw = stack(&["__next_metadata_boundary__Extra"]);
        assert!(!ComponentStack::parse(&raw).contains(Boundary::Metadata));
    }

    #[test]
    fn test_suspense_above_body() {
        let raw = stack(&["Page", "Suspense", "Providers", ROOT_LAYOUT_BOUNDARY_NAME]);
        assert!(ComponentStack::parse(&raw).has_suspense_above_body());
    }

    #[test]
    fn test_suspense_inside_body() {
        let raw = stack(&["Page", "Suspense", "main", ROOT_LAYOUT_BOUNDARY_NAME]);
        let parsed = ComponentStack::parse(&raw);
        assert!(!parsed.has_suspense_above_body());
        assert!(parsed.contains(Boundary::Suspense));
    }

    #[test]
    fn test_suspense_without_root_layout() {
        let raw = stack(&["Page", "Suspense", "Layout"]);
        assert!(!ComponentStack::parse(&raw).has_suspense_above_body());
    }

    #[test]
    fn test_any_suspense_frame_can_qualify() {
        let raw = stack(&[
            "Page",
            "Suspense",
            "div",
            "Suspense",
            ROOT_LAYOUT_BOUNDARY_NAME,
        ]);
        assert!(ComponentStack::parse(&raw).has_suspense_above_body());
    }
}
