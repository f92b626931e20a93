//! Per-step audit records.
//!
//! One [`StepLog`] is appended per iteration. Entries are never mutated once
//! appended; the only enrichment allowed is [`StepLog::complete`], which
//! back-fills the action half of the same step before it is pushed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::failure::FailureCategory;

/// Why a step stopped at the probe gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Classified category
    pub category: FailureCategory,
    /// Probe diagnostic
    pub reason: String,
}

impl StepFailure {
    pub fn new(category: FailureCategory, reason: impl Into<String>) -> Self {
        Self {
            category,
            reason: reason.into(),
        }
    }
}

/// One iteration of a control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLog<S, A> {
    /// Step index, equal to the entry's position in the log
    pub t: usize,
    /// When the entry was created
    pub at: DateTime<Utc>,
    /// Observed state at the start of the step
    pub state: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<A>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<f64>,
    /// Ladder level after the step
    pub ladder_level: f64,
    /// Budget remaining after the step
    pub budget_remaining: f64,
    pub probe_id: String,
    pub policy_id: String,
    /// Set when the step was abandoned at the probe gate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
    /// Aggregate probe verdict (hierarchical inner loop only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_passed: Option<bool>,
    /// Stability verdict (hierarchical inner loop only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable: Option<bool>,
    /// Outer-loop attempt number (hierarchical inner loop only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<usize>,
}

impl<S, A> StepLog<S, A> {
    /// Start an entry for step `t` over `state`.
    pub fn new(t: usize, state: S, probe_id: impl Into<String>, policy_id: impl Into<String>) -> Self {
        Self {
            t,
            at: Utc::now(),
            state,
            action: None,
            next: None,
            feedback: None,
            ladder_level: 0.0,
            budget_remaining: 0.0,
            probe_id: probe_id.into(),
            policy_id: policy_id.into(),
            failure: None,
            probe_passed: None,
            stable: None,
            attempt: None,
        }
    }

    /// Record ladder level and remaining budget as of the end of the step.
    pub fn with_gauges(mut self, ladder_level: f64, budget_remaining: f64) -> Self {
        self.ladder_level = ladder_level;
        self.budget_remaining = budget_remaining;
        self
    }

    /// Mark the step as abandoned at the probe gate.
    pub fn with_failure(mut self, failure: StepFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Attach hierarchical inner-loop fields.
    pub fn with_inner(mut self, attempt: usize, probe_passed: bool, stable: bool) -> Self {
        self.attempt = Some(attempt);
        self.probe_passed = Some(probe_passed);
        self.stable = Some(stable);
        self
    }

    /// Back-fill the action half of the step.
    pub fn complete(mut self, action: A, next: S, feedback: f64) -> Self {
        self.action = Some(action);
        self.next = Some(next);
        self.feedback = Some(feedback);
        self
    }

    /// True when the step never reached the policy.
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
