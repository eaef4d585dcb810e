//! Render stages and prerender outcomes.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of a single render attempt.
///
/// `Before < Static < Runtime < Dynamic`. `Abandoned` is a terminal sentinel
/// that does not compare against the other stages: it means the attempt was
/// scrapped and will be retried with a fresh controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStage {
    Before = 1,
    Static = 2,
    Runtime = 3,
    Dynamic = 4,
    Abandoned = 5,
}

impl RenderStage {
    /// Numeric rank of the stage.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Stages that can be waited on or listened for.
    pub fn is_awaitable(self) -> bool {
        matches!(self, Self::Runtime | Self::Dynamic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Static => "static",
            Self::Runtime => "runtime",
            Self::Dynamic => "dynamic",
            Self::Abandoned => "abandoned",
        }
    }
}

impl PartialOrd for RenderStage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Abandoned, Self::Abandoned) => Some(Ordering::Equal),
            (Self::Abandoned, _) | (_, Self::Abandoned) => None,
            _ => self.rank().partial_cmp(&other.rank()),
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a prerender managed to produce as its static prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreludeState {
    /// Fully static, no holes.
    Full = 0,
    /// Nothing static was produced.
    Empty = 1,
    /// Static generation failed.
    Errored = 2,
}
