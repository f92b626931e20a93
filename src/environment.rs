//! Environments and evaluators.
//!
//! The environment is the only side-effecting component of a run. It owns
//! the current state; nothing else mutates it.

use async_trait::async_trait;

use crate::error::Result;

/// Observes and advances the domain.
#[async_trait]
pub trait Environment<S, A>: Send + Sync {
    /// Current state. Must have no side effects.
    async fn observe(&self) -> Result<S>;

    /// Apply an action and return the resulting state.
    async fn apply(&mut self, action: &A) -> Result<S>;

    /// Continue from `state` (called after an outer-loop plan or replan).
    async fn reset(&mut self, _state: &S) -> Result<()> {
        Ok(())
    }
}

/// Computes feedback from a state transition.
#[async_trait]
pub trait Evaluator<S>: Send + Sync {
    async fn evaluate(&self, prev: &S, next: &S) -> Result<f64>;
}

/// Pure state transition used by [`OwnedEnvironment`].
pub trait Transition<S, A>: Send + Sync {
    fn apply(&self, state: &S, action: &A) -> Result<S>;
}

/// An environment that owns its state and delegates transitions.
#[derive(Debug, Clone)]
pub struct OwnedEnvironment<S, T> {
    state: S,
    transition: T,
}

impl<S, T> OwnedEnvironment<S, T> {
    pub fn new(initial: S, transition: T) -> Self {
        Self {
            state: initial,
            transition,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

#[async_trait]
impl<S, A, T> Environment<S, A> for OwnedEnvironment<S, T>
where
    S: Clone + Send + Sync,
    A: Sync,
    T: Transition<S, A>,
{
    async fn observe(&self) -> Result<S> {
        Ok(self.state.clone())
    }

    async fn apply(&mut self, action: &A) -> Result<S> {
        let next = self.transition.apply(&self.state, action)?;
        self.state = next.clone();
        Ok(next)
    }

    async fn reset(&mut self, state: &S) -> Result<()> {
        self.state = state.clone();
        Ok(())
    }
}

/// States that carry a scalar quality score.
pub trait Scored {
    fn score(&self) -> f64;
}

/// Feedback is the change in score across the transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreDeltaEvaluator;

#[async_trait]
impl<S> Evaluator<S> for ScoreDeltaEvaluator
where
    S: Scored + Sync,
{
    async fn evaluate(&self, prev: &S, next: &S) -> Result<f64> {
        Ok(next.score() - prev.score())
    }
}
