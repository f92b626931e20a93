//! Engine events for external observability.
//!
//! Events are emitted at fixed points of a run and delivered to an
//! [`EventSink`](crate::events::EventSink). They carry ids and gauges only,
//! never domain state, so sinks stay independent of `S` and `A`.

use serde::{Deserialize, Serialize};

use crate::domain::failure::FailureCategory;
use crate::domain::outcome::StopReason;

/// Event type constants
pub mod event_types {
    pub const PROBE_STARTED: &str = "probe.started";
    pub const PROBE_RESULT: &str = "probe.result";
    pub const ACTION_TAKEN: &str = "action.taken";
    pub const BUDGET_CHANGED: &str = "budget.changed";
    pub const STEP_COMPLETE: &str = "step.complete";
    pub const STRATEGY_SWITCH: &str = "strategy.switch";
    pub const RUN_STOPPED: &str = "run.stopped";
    pub const OUTER_PLAN: &str = "outer.plan";
    pub const OUTER_EVALUATE: &str = "outer.evaluate";
    pub const OUTER_REPLAN: &str = "outer.replan";
}

/// Something observable happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    #[serde(rename = "probe.started")]
    ProbeStarted { t: usize, probe: String },

    #[serde(rename = "probe.result")]
    ProbeResult {
        t: usize,
        probe: String,
        passed: bool,
        reason: Option<String>,
    },

    #[serde(rename = "action.taken")]
    ActionTaken { t: usize, policy: String, feedback: f64 },

    #[serde(rename = "budget.changed")]
    BudgetChanged { t: usize, charged: f64, remaining: f64 },

    #[serde(rename = "step.complete")]
    StepComplete {
        t: usize,
        ladder_level: f64,
        failure: Option<FailureCategory>,
    },

    #[serde(rename = "strategy.switch")]
    StrategySwitch {
        t: usize,
        failure: FailureCategory,
        from_probe: String,
        to_probe: String,
        from_policy: String,
        to_policy: String,
    },

    #[serde(rename = "run.stopped")]
    Stopped { t: usize, reason: StopReason },

    #[serde(rename = "outer.plan")]
    OuterPlan { calls: usize },

    #[serde(rename = "outer.evaluate")]
    OuterEvaluate { calls: usize },

    #[serde(rename = "outer.replan")]
    OuterReplan { calls: usize, accepted: bool },
}

impl EngineEvent {
    /// The dotted event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::ProbeStarted { .. } => event_types::PROBE_STARTED,
            EngineEvent::ProbeResult { .. } => event_types::PROBE_RESULT,
            EngineEvent::ActionTaken { .. } => event_types::ACTION_TAKEN,
            EngineEvent::BudgetChanged { .. } => event_types::BUDGET_CHANGED,
            EngineEvent::StepComplete { .. } => event_types::STEP_COMPLETE,
            EngineEvent::StrategySwitch { .. } => event_types::STRATEGY_SWITCH,
            EngineEvent::Stopped { .. } => event_types::RUN_STOPPED,
            EngineEvent::OuterPlan { .. } => event_types::OUTER_PLAN,
            EngineEvent::OuterEvaluate { .. } => event_types::OUTER_EVALUATE,
            EngineEvent::OuterReplan { .. } => event_types::OUTER_REPLAN,
        }
    }

    /// Check if this is an outer-loop event
    pub fn is_outer_event(&self) -> bool {
        self.event_type().starts_with("outer.")
    }
}
