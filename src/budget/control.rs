//! Two-level budget for the hierarchical orchestrator.

use crate::budget::traits::BudgetTracker;

/// Inner (cheap, frequent) and outer (expensive, rare) budgets.
///
/// The two trackers are independent; the outer loop resets `inner_loop`
/// whenever it starts a fresh exploration attempt.
pub struct ControlBudget {
    pub inner_loop: Box<dyn BudgetTracker>,
    pub outer_loop: Box<dyn BudgetTracker>,
}

impl ControlBudget {
    pub fn new(inner_loop: impl BudgetTracker + 'static, outer_loop: impl BudgetTracker + 'static) -> Self {
        Self {
            inner_loop: Box::new(inner_loop),
            outer_loop: Box::new(outer_loop),
        }
    }

    pub fn from_boxed(inner_loop: Box<dyn BudgetTracker>, outer_loop: Box<dyn BudgetTracker>) -> Self {
        Self { inner_loop, outer_loop }
    }

    /// True if either sub-budget is exhausted.
    pub fn should_stop(&self) -> bool {
        self.inner_loop.should_stop() || self.outer_loop.should_stop()
    }
}

impl std::fmt::Debug for ControlBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBudget")
            .field("inner_remaining", &self.inner_loop.remaining())
            .field("outer_remaining", &self.outer_loop.remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{MultiBudget, SimpleBudget};
    use crate::domain::Cost;

    #[test]
    fn test_fresh_control_budget() {
        let budget = ControlBudget::new(SimpleBudget::new(10.0), SimpleBudget::new(3.0));
        assert!(!budget.should_stop());
    }

    #[test]
    fn test_inner_exhaustion_stops() {
        let mut budget = ControlBudget::new(SimpleBudget::new(2.0), SimpleBudget::new(3.0));
        budget.inner_loop.record(&Cost::Scalar(2.0));
        assert!(budget.should_stop());
        assert!(!budget.outer_loop.should_stop());
    }

    #[test]
    fn test_outer_exhaustion_stops() {
        let mut budget = ControlBudget::new(SimpleBudget::new(10.0), SimpleBudget::new(1.0));
        budget.outer_loop.record(&Cost::Scalar(1.0));
        assert!(budget.should_stop());
    }

    #[test]
    fn test_inner_reset_is_independent() {
        let mut budget = ControlBudget::new(SimpleBudget::new(2.0), SimpleBudget::new(3.0));
        budget.inner_loop.record(&Cost::Scalar(2.0));
        budget.outer_loop.record(&Cost::Scalar(1.0));

        budget.inner_loop.reset(None);
        assert_eq!(budget.inner_loop.remaining(), 2.0);
        assert_eq!(budget.outer_loop.remaining(), 2.0);
        assert!(!budget.should_stop());
    }

    #[test]
    fn test_mixed_trackers() {
        let inner = MultiBudget::default().with_cap("probes", 5.0).with_cap("steps", 5.0);
        let budget = ControlBudget::new(inner, SimpleBudget::new(3.0));
        assert_eq!(budget.inner_loop.remaining(), 1.0);
    }
}
