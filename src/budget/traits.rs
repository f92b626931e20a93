//! Budget tracker interface.

use crate::domain::Cost;

/// Accounts consumed cost against a finite cap.
pub trait BudgetTracker: Send + Sync {
    /// Deduct a cost.
    fn record(&mut self, cost: &Cost);

    /// Remaining amount. Absolute or a fraction, depending on the tracker.
    fn remaining(&self) -> f64;

    /// True once any cap is exhausted.
    fn should_stop(&self) -> bool;

    /// Restore the initial cap, or replace it with `value`.
    fn reset(&mut self, value: Option<&Cost>);
}
