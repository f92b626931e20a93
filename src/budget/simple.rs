//! Single-cap budget.

use crate::budget::traits::BudgetTracker;
use crate::domain::Cost;

/// One cap, reported as an absolute remaining amount floored at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleBudget {
    initial: f64,
    remaining: f64,
}

impl SimpleBudget {
    /// Negative caps are treated as zero.
    pub fn new(cap: f64) -> Self {
        let cap = cap.max(0.0);
        Self {
            initial: cap,
            remaining: cap,
        }
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Amount consumed since the last reset.
    pub fn used(&self) -> f64 {
        self.initial - self.remaining
    }
}

impl BudgetTracker for SimpleBudget {
    fn record(&mut self, cost: &Cost) {
        self.remaining = (self.remaining - cost.total()).max(0.0);
    }

    fn remaining(&self) -> f64 {
        self.remaining
    }

    fn should_stop(&self) -> bool {
        self.remaining <= 0.0
    }

    fn reset(&mut self, value: Option<&Cost>) {
        if let Some(cost) = value {
            self.initial = cost.total().max(0.0);
        }
        self.remaining = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_budget() {
        let budget = SimpleBudget::new(10.0);
        assert_eq!(budget.remaining(), 10.0);
        assert!(!budget.should_stop());
    }

    #[test]
    fn test_record_scalar() {
        let mut budget = SimpleBudget::new(10.0);
        budget.record(&Cost::Scalar(2.0));
        assert_eq!(budget.remaining(), 8.0);
        assert_eq!(budget.used(), 2.0);
    }

    #[test]
    fn test_record_dimensions_sums_all() {
        let mut budget = SimpleBudget::new(10.0);
        budget.record(&Cost::from_pairs([("tokens", 3.0), ("steps", 1.0)]));
        assert_eq!(budget.remaining(), 6.0);
    }

    #[test]
    fn test_overspend_floors_at_zero() {
        let mut budget = SimpleBudget::new(3.0);
        budget.record(&Cost::Scalar(100.0));
        assert_eq!(budget.remaining(), 0.0);
        assert!(budget.should_stop());

        budget.record(&Cost::Scalar(1.0));
        assert!(budget.remaining() >= 0.0);
    }

    #[test]
    fn test_zero_cap_is_exhausted() {
        assert!(SimpleBudget::new(0.0).should_stop());
        assert!(SimpleBudget::new(-5.0).should_stop());
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut budget = SimpleBudget::new(5.0);
        budget.record(&Cost::Scalar(5.0));
        assert!(budget.should_stop());

        budget.reset(None);
        assert_eq!(budget.remaining(), 5.0);
    }

    #[test]
    fn test_reset_with_value_replaces_cap() {
        let mut budget = SimpleBudget::new(5.0);
        budget.reset(Some(&Cost::Scalar(12.0)));
        assert_eq!(budget.remaining(), 12.0);
        assert_eq!(budget.initial(), 12.0);
    }
}
