//! Decision policies.
//!
//! A policy turns the current state and ladder level into the next action.
//! How it decides is entirely up to the implementation; the engine only
//! reads its declared [`PolicyCapabilities`] for routing and accounting.

use async_trait::async_trait;

use crate::domain::{Cost, FailureCategory};
use crate::error::Result;
use crate::ladder::Ladder;

/// Declared per-step cost of a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyCost {
    /// Charged against the budget for every action taken
    pub step: f64,
    /// Expected total cost of a run, informational only
    pub expected: Option<f64>,
}

impl Default for PolicyCost {
    fn default() -> Self {
        Self {
            step: 1.0,
            expected: None,
        }
    }
}

/// Routing metadata a policy declares about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyCapabilities {
    /// Failure categories this policy is designed to recover from
    pub handles: Vec<FailureCategory>,
    /// Inclusive ladder window in which the policy performs best
    pub exploration_range: (f64, f64),
    pub cost: PolicyCost,
}

impl Default for PolicyCapabilities {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
            exploration_range: (f64::NEG_INFINITY, f64::INFINITY),
            cost: PolicyCost::default(),
        }
    }
}

impl PolicyCapabilities {
    pub fn handling(mut self, categories: impl IntoIterator<Item = FailureCategory>) -> Self {
        self.handles.extend(categories);
        self
    }

    pub fn within(mut self, min: f64, max: f64) -> Self {
        self.exploration_range = (min, max);
        self
    }

    pub fn costing(mut self, step: f64) -> Self {
        self.cost.step = step;
        self
    }

    pub fn handles(&self, category: FailureCategory) -> bool {
        self.handles.contains(&category)
    }

    /// True if `level` lies within the exploration window.
    pub fn covers(&self, level: f64) -> bool {
        let (min, max) = self.exploration_range;
        level >= min && level <= max
    }
}

/// Decides the next action.
#[async_trait]
pub trait Policy<S, A>: Send + Sync {
    /// Stable identifier used in logs and routing
    fn id(&self) -> &str;

    /// Choose an action for `state` at the ladder's current level.
    async fn decide(&self, state: &S, ladder: &dyn Ladder) -> Result<A>;

    /// Update internal parameters from the last step's feedback. No-op by default.
    async fn adapt(&mut self, _feedback: f64, _ladder: &dyn Ladder) -> Result<()> {
        Ok(())
    }

    fn capabilities(&self) -> PolicyCapabilities {
        PolicyCapabilities::default()
    }
}

/// A cheap, inner-loop policy that can tell when exploration has converged.
#[async_trait]
pub trait ProbePolicy<S, A>: Policy<S, A> {
    /// Reset internal memory at the start of an outer-loop attempt.
    async fn initialize(&mut self, state: &S) -> Result<()>;

    /// Cheap convergence predicate; no expensive evaluation.
    async fn is_stable(&self, state: &S) -> Result<bool>;
}

/// Prices an action before it is charged to the budget.
///
/// Returning `None` falls back to the policy's declared step cost.
pub trait ActionCost<A>: Send + Sync {
    fn cost(&self, action: &A) -> Option<Cost>;
}
