//! Runner module - drives whole runs on top of the control kernel.
//!
//! This module provides:
//! - Orchestrator for the flat, probe-gated loop with strategy switching
//! - HierarchicalOrchestrator for plan → inner loop → evaluate/replan
//! - Planner, the outer-loop seam of the hierarchical form

mod flat;
mod hierarchical;
mod planner;

use serde::{Deserialize, Serialize};

use crate::kernel::RetryConfig;

pub use flat::{Orchestrator, RunReport};
pub use hierarchical::{ExplorationOutcome, ExplorationReport, HierarchicalOrchestrator, OuterCosts};
pub use planner::Planner;

/// Step limits and retry counts shared by both orchestrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound on flat-loop steps
    pub max_steps: usize,
    /// Upper bound on micro-steps per inner-loop attempt
    pub max_inner_steps: usize,
    /// Re-select/re-test rounds after a probe failure
    pub reselection_rounds: usize,
    /// Upper bound on accepted replans in one exploration
    pub max_replans: usize,
    pub retries: RetryConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_inner_steps: 20,
            reselection_rounds: 1,
            max_replans: 10,
            retries: RetryConfig::default(),
        }
    }
}
