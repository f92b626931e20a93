//! Termination policies, independent of budget trackers.

use serde::{Deserialize, Serialize};

use crate::domain::StopReason;

/// Run gauges consulted after every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminationContext {
    pub t: usize,
    pub budget_remaining: f64,
    pub no_improvement_steps: usize,
    pub last_feedback: Option<f64>,
}

/// Decides whether to stop. `None` means continue.
pub trait TerminationPolicy: Send + Sync {
    fn should_stop(&self, ctx: &TerminationContext) -> Option<StopReason>;
}

/// Budget, stagnation and feedback-floor rules. Unset thresholds are disabled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdTermination {
    /// Stop once this many consecutive steps fail to improve
    pub stagnation_steps: Option<usize>,
    /// Stop once the last feedback is at or below this value
    pub feedback_floor: Option<f64>,
}

impl ThresholdTermination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stagnation(mut self, steps: usize) -> Self {
        self.stagnation_steps = Some(steps);
        self
    }

    pub fn with_feedback_floor(mut self, floor: f64) -> Self {
        self.feedback_floor = Some(floor);
        self
    }
}

impl TerminationPolicy for ThresholdTermination {
    fn should_stop(&self, ctx: &TerminationContext) -> Option<StopReason> {
        if ctx.budget_remaining <= 0.0 {
            return Some(StopReason::BudgetExhausted);
        }
        if let Some(limit) = self.stagnation_steps
            && ctx.no_improvement_steps >= limit
        {
            return Some(StopReason::Stagnation);
        }
        if let (Some(floor), Some(feedback)) = (self.feedback_floor, ctx.last_feedback)
            && feedback <= floor
        {
            return Some(StopReason::FeedbackThreshold);
        }
        None
    }
}
