//! Failure categories produced by probe classification.

use serde::{Deserialize, Serialize};

/// Closed set of reasons a step could not proceed past probing.
///
/// Reasons that cannot be classified map to [`FailureCategory::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Nothing recognizable
    #[default]
    Unknown,
    /// The state yielded no data at all
    NoData,
    /// Exploration is too constrained
    TooNarrow,
    /// Exploration is too loose
    TooBroad,
    /// Access was refused
    AuthDenied,
    /// A rate limit was hit
    RateLimited,
    /// A required tool is not available
    ToolMissing,
    /// The goal cannot be reached from here
    Infeasible,
}

impl FailureCategory {
    /// Every category, in declaration order.
    pub const ALL: [FailureCategory; 8] = [
        FailureCategory::Unknown,
        FailureCategory::NoData,
        FailureCategory::TooNarrow,
        FailureCategory::TooBroad,
        FailureCategory::AuthDenied,
        FailureCategory::RateLimited,
        FailureCategory::ToolMissing,
        FailureCategory::Infeasible,
    ];

    /// Get the snake_case name for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Unknown => "unknown",
            FailureCategory::NoData => "no_data",
            FailureCategory::TooNarrow => "too_narrow",
            FailureCategory::TooBroad => "too_broad",
            FailureCategory::AuthDenied => "auth_denied",
            FailureCategory::RateLimited => "rate_limited",
            FailureCategory::ToolMissing => "tool_missing",
            FailureCategory::Infeasible => "infeasible",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
