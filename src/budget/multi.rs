//! Multi-dimension budget.
//!
//! Each named cap is tracked independently. `remaining()` is the smallest
//! remaining fraction across caps, so the tightest dimension governs.

use std::collections::BTreeMap;

use crate::budget::traits::BudgetTracker;
use crate::domain::Cost;

/// Several named caps (e.g. `tokens`, `steps`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiBudget {
    caps: BTreeMap<String, f64>,
    used: BTreeMap<String, f64>,
}

impl MultiBudget {
    pub fn new(caps: BTreeMap<String, f64>) -> Self {
        Self {
            caps,
            used: BTreeMap::new(),
        }
    }

    /// Builder form: add or replace one cap.
    pub fn with_cap(mut self, name: impl Into<String>, cap: f64) -> Self {
        self.caps.insert(name.into(), cap);
        self
    }

    pub fn cap(&self, name: &str) -> Option<f64> {
        self.caps.get(name).copied()
    }

    /// Amount charged to `name` since the last reset.
    pub fn used(&self, name: &str) -> f64 {
        self.used.get(name).copied().unwrap_or(0.0)
    }

    /// Remaining fraction of a single cap. Unset or non-positive caps report 0.
    pub fn remaining_fraction(&self, name: &str) -> f64 {
        match self.caps.get(name) {
            Some(&cap) if cap > 0.0 => ((cap - self.used(name)) / cap).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    fn is_exhausted(&self, name: &str, cap: f64) -> bool {
        cap <= 0.0 || self.used(name) >= cap
    }
}

impl BudgetTracker for MultiBudget {
    fn record(&mut self, cost: &Cost) {
        match cost {
            // A scalar is a uniform unit charged to every cap
            Cost::Scalar(amount) => {
                for name in self.caps.keys() {
                    *self.used.entry(name.clone()).or_insert(0.0) += amount;
                }
            }
            Cost::Dimensions(dims) => {
                for (name, amount) in dims {
                    *self.used.entry(name.clone()).or_insert(0.0) += amount;
                }
            }
        }
    }

    fn remaining(&self) -> f64 {
        self.caps
            .keys()
            .map(|name| self.remaining_fraction(name))
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    fn should_stop(&self) -> bool {
        self.caps.is_empty() || self.caps.iter().any(|(name, &cap)| self.is_exhausted(name, cap))
    }

    fn reset(&mut self, value: Option<&Cost>) {
        match value {
            None => {}
            Some(Cost::Scalar(amount)) => {
                for cap in self.caps.values_mut() {
                    *cap = *amount;
                }
            }
            Some(Cost::Dimensions(dims)) => self.caps = dims.clone(),
        }
        self.used.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> MultiBudget {
        MultiBudget::default().with_cap("tokens", 100.0).with_cap("steps", 4.0)
    }

    #[test]
    fn test_fresh_budget_is_full() {
        let budget = budget();
        assert_eq!(budget.remaining(), 1.0);
        assert!(!budget.should_stop());
    }

    #[test]
    fn test_remaining_is_min_fraction() {
        let mut budget = budget();
        budget.record(&Cost::from_pairs([("tokens", 10.0), ("steps", 2.0)]));
        // tokens at 0.9, steps at 0.5
        assert_eq!(budget.remaining(), 0.5);
    }

    #[test]
    fn test_stops_when_any_cap_reached() {
        let mut budget = budget();
        budget.record(&Cost::dimension("steps", 3.0));
        assert!(!budget.should_stop());
        budget.record(&Cost::dimension("steps", 1.0));
        assert!(budget.should_stop());
        assert_eq!(budget.remaining(), 0.0);
        assert_eq!(budget.remaining_fraction("tokens"), 1.0);
    }

    #[test]
    fn test_scalar_charges_every_cap() {
        let mut budget = budget();
        budget.record(&Cost::Scalar(2.0));
        assert_eq!(budget.used("tokens"), 2.0);
        assert_eq!(budget.used("steps"), 2.0);
    }

    #[test]
    fn test_unknown_dimension_never_exhausts() {
        let mut budget = budget();
        budget.record(&Cost::dimension("calls", 1000.0));
        assert!(!budget.should_stop());
        assert_eq!(budget.used("calls"), 1000.0);
    }

    #[test]
    fn test_zero_cap_is_always_exhausted() {
        let budget = MultiBudget::default().with_cap("tokens", 100.0).with_cap("steps", 0.0);
        assert!(budget.should_stop());
        assert_eq!(budget.remaining(), 0.0);
    }

    #[test]
    fn test_empty_budget_is_exhausted() {
        let budget = MultiBudget::default();
        assert!(budget.should_stop());
        assert_eq!(budget.remaining(), 0.0);
    }

    #[test]
    fn test_should_stop_iff_some_used_reaches_cap() {
        let mut budget = budget();
        let charges = [
            Cost::dimension("tokens", 40.0),
            Cost::dimension("steps", 1.0),
            Cost::dimension("tokens", 59.0),
            Cost::dimension("steps", 2.0),
            Cost::dimension("tokens", 1.0),
        ];
        for charge in &charges {
            budget.record(charge);
            let expected = budget.used("tokens") >= 100.0 || budget.used("steps") >= 4.0;
            assert_eq!(budget.should_stop(), expected);
        }
        assert!(budget.should_stop());
    }

    #[test]
    fn test_reset_clears_usage() {
        let mut budget = budget();
        budget.record(&Cost::dimension("steps", 4.0));
        budget.reset(None);
        assert_eq!(budget.used("steps"), 0.0);
        assert!(!budget.should_stop());
    }

    #[test]
    fn test_reset_with_dimensions_replaces_caps() {
        let mut budget = budget();
        budget.reset(Some(&Cost::dimension("calls", 3.0)));
        assert_eq!(budget.cap("calls"), Some(3.0));
        assert_eq!(budget.cap("tokens"), None);
    }

    #[test]
    fn test_reset_with_scalar_sets_every_cap() {
        let mut budget = budget();
        budget.reset(Some(&Cost::Scalar(7.0)));
        assert_eq!(budget.cap("tokens"), Some(7.0));
        assert_eq!(budget.cap("steps"), Some(7.0));
    }
}
