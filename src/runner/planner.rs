//! Outer-loop planner for the hierarchical orchestrator.

use async_trait::async_trait;

use crate::error::Result;

/// Expensive, global reasoning over the whole exploration.
///
/// Each call is charged to the outer budget.
#[async_trait]
pub trait Planner<S>: Send + Sync {
    /// Turn user input into an initial state.
    async fn plan(&self, input: &str) -> Result<S>;

    /// Produce the final output from a stable state and its history.
    async fn evaluate(&self, state: &S, history: &[S]) -> Result<String>;

    /// Propose a fresh state after an inner loop gave up, or `None` to stop.
    async fn replan(&self, state: &S, history: &[S]) -> Result<Option<S>>;
}
