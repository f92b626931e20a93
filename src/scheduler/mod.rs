//! Meta-control for the step loop.
//!
//! This module decides *what* runs next, never *how* it runs:
//! - FailureClassifier: maps probe failures onto the failure taxonomy
//! - StrategySelector: picks the probe/policy pair for a failure
//! - TerminationPolicy: stops on stagnation or a feedback floor

pub mod classify;
pub mod select;
pub mod termination;

pub use classify::{ClassificationContext, FailureClassifier, FailureMetrics, RuleClassifier, classify_reason};
pub use select::{
    CapabilitySelector, Candidate, PolicyCandidate, ProbeCandidate, Selection, SelectionContext, StrategySelector,
};
pub use termination::{TerminationContext, TerminationPolicy, ThresholdTermination};
