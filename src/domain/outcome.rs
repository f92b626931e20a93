//! Run termination reasons.

use serde::{Deserialize, Serialize};

/// Why a run (or an inner loop) stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// A budget tracker reported exhaustion
    BudgetExhausted,
    /// Too many steps without improvement
    Stagnation,
    /// Last feedback fell to or below the configured floor
    FeedbackThreshold,
    /// The step cap was reached
    MaxSteps,
    /// The probe-policy reported convergence
    Stable,
    /// Hierarchical exploration gave up
    Unresolved(String),
}

impl StopReason {
    /// Machine-readable reason.
    pub fn as_str(&self) -> &str {
        match self {
            StopReason::BudgetExhausted => "budget-exhausted",
            StopReason::Stagnation => "stagnation",
            StopReason::FeedbackThreshold => "feedback-threshold",
            StopReason::MaxSteps => "max-steps",
            StopReason::Stable => "stable",
            StopReason::Unresolved(_) => "unresolved",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Unresolved(detail) => write!(f, "unresolved: {}", detail),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
