//! The one-step control primitive.
//!
//! observe → decide → apply → evaluate → adapt → update-ladder
//!
//! Usable on its own for simple loops; the flat orchestrator wraps it with
//! probing, routing and accounting.

use log::debug;

use crate::environment::{Environment, Evaluator};
use crate::error::Result;
use crate::kernel::retry::RetryConfig;
use crate::ladder::Ladder;
use crate::policy::Policy;

/// Everything one kernel step touched.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelStep<S, A> {
    pub state: S,
    pub action: A,
    pub next: S,
    pub feedback: f64,
}

/// Runs single control steps with per-phase immediate retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlKernel {
    retries: RetryConfig,
}

impl ControlKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retries(retries: RetryConfig) -> Self {
        Self { retries }
    }

    pub fn retries(&self) -> RetryConfig {
        self.retries
    }

    /// Run one step.
    ///
    /// Pass `Some(state)` to reuse an observation the caller already made;
    /// `None` observes afresh. Any phase error left after its retries is
    /// returned as-is.
    pub async fn step<S, A>(
        &self,
        observed: Option<S>,
        environment: &mut dyn Environment<S, A>,
        policy: &mut dyn Policy<S, A>,
        evaluator: &dyn Evaluator<S>,
        ladder: &mut dyn Ladder,
    ) -> Result<KernelStep<S, A>>
    where
        S: Send + Sync,
        A: Send + Sync,
    {
        let state = match observed {
            Some(state) => state,
            None => crate::retry_phase!("observe", self.retries.observe, environment.observe())?,
        };

        let action = crate::retry_phase!("decide", self.retries.decide, policy.decide(&state, &*ladder))?;
        let next = crate::retry_phase!("apply", self.retries.apply, environment.apply(&action))?;
        let feedback = crate::retry_phase!("evaluate", self.retries.evaluate, evaluator.evaluate(&state, &next))?;

        policy.adapt(feedback, &*ladder).await?;
        ladder.update(feedback);

        debug!(
            "kernel step by {}: feedback={:.3} ladder={:.3}",
            policy.id(),
            feedback,
            ladder.level()
        );

        Ok(KernelStep {
            state,
            action,
            next,
            feedback,
        })
    }
}
