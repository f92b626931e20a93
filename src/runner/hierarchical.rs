//! Hierarchical orchestrator: a planner-driven outer loop over a cheap
//! probe-guided inner loop.
//!
//! plan → (inner loop → stable? evaluate : replan)* with two budgets:
//! the inner budget pays for probes and micro-steps and is reset on every
//! accepted replan; the outer budget pays for planner calls only. Accepted
//! replans are also capped by `max_replans`, so zero-cost planners still stop.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::budget::ControlBudget;
use crate::domain::{Cost, EngineEvent, StepLog, StopReason};
use crate::environment::{Environment, Evaluator};
use crate::error::Result;
use crate::events::{EventSink, NoopSink};
use crate::kernel::with_retry;
use crate::ladder::{ExplorationLadder, Ladder};
use crate::policy::{Policy, ProbePolicy};
use crate::probe::{Probe, ProbeResult, ProbeSet};
use crate::runner::{OrchestratorConfig, Planner};
use crate::scheduler::{TerminationContext, TerminationPolicy};

/// Outer-budget charge per planner call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OuterCosts {
    pub plan: Cost,
    pub evaluate: Cost,
    pub replan: Cost,
}

impl Default for OuterCosts {
    fn default() -> Self {
        Self {
            plan: Cost::Scalar(1.0),
            evaluate: Cost::Scalar(1.0),
            replan: Cost::Scalar(1.0),
        }
    }
}

/// How an exploration ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationOutcome {
    /// The planner's evaluation of a stable state
    Resolved(String),
    /// No stable state was reached
    Unresolved { reason: String },
}

impl ExplorationOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Everything a hierarchical run produced.
#[derive(Debug, Clone)]
pub struct ExplorationReport<S, A> {
    pub outcome: ExplorationOutcome,
    pub final_state: S,
    /// Planned state followed by every inner-loop state, across attempts
    pub history: Vec<S>,
    pub logs: Vec<StepLog<S, A>>,
    /// Micro-steps across all attempts
    pub inner_steps: usize,
    /// plan + evaluate + replan calls
    pub outer_loop_calls: usize,
    /// Replans that produced a new state
    pub replans: usize,
    /// Why the last inner loop ended
    pub stop_reason: StopReason,
}

enum InnerStatus {
    Stable,
    Exhausted(StopReason),
}

/// Runs plan → inner loop → evaluate/replan.
pub struct HierarchicalOrchestrator<S, A> {
    planner: Box<dyn Planner<S>>,
    policy: Box<dyn ProbePolicy<S, A>>,
    probes: ProbeSet<S>,
    environment: Box<dyn Environment<S, A>>,
    evaluator: Box<dyn Evaluator<S>>,
    ladder: Box<dyn Ladder>,
    budget: ControlBudget,
    termination: Option<Box<dyn TerminationPolicy>>,
    costs: OuterCosts,
    events: Arc<dyn EventSink>,
    config: OrchestratorConfig,
}

impl<S, A> HierarchicalOrchestrator<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    pub fn new(
        planner: impl Planner<S> + 'static,
        policy: impl ProbePolicy<S, A> + 'static,
        environment: impl Environment<S, A> + 'static,
        evaluator: impl Evaluator<S> + 'static,
        budget: ControlBudget,
    ) -> Self {
        Self {
            planner: Box::new(planner),
            policy: Box::new(policy),
            probes: ProbeSet::new(),
            environment: Box::new(environment),
            evaluator: Box::new(evaluator),
            ladder: Box::new(ExplorationLadder::new()),
            budget,
            termination: None,
            costs: OuterCosts::default(),
            events: Arc::new(NoopSink),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_probe(mut self, probe: impl Probe<S> + 'static) -> Self {
        self.probes = self.probes.with_probe(probe);
        self
    }

    pub fn with_probes(mut self, probes: ProbeSet<S>) -> Self {
        self.probes = probes;
        self
    }

    pub fn with_ladder(mut self, ladder: impl Ladder + 'static) -> Self {
        self.ladder = Box::new(ladder);
        self
    }

    /// Stagnation/floor rules for the inner loop. A stop ends the attempt
    /// the same way inner-budget exhaustion does.
    pub fn with_termination(mut self, termination: impl TerminationPolicy + 'static) -> Self {
        self.termination = Some(Box::new(termination));
        self
    }

    pub fn with_outer_costs(mut self, costs: OuterCosts) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn budget(&self) -> &ControlBudget {
        &self.budget
    }

    pub fn ladder_level(&self) -> f64 {
        self.ladder.level()
    }

    /// Explore from `input` until a stable state is evaluated or the
    /// planner and budgets give up.
    pub async fn run(&mut self, input: &str) -> Result<ExplorationReport<S, A>> {
        let retries = self.config.retries.plan;
        let mut outer_loop_calls = 0;
        let mut replans = 0;
        let mut attempt = 0;
        let mut logs: Vec<StepLog<S, A>> = Vec::new();

        info!("Planning exploration for input ({} chars)", input.len());
        let mut state = with_retry("plan", retries, || self.planner.plan(input)).await?;
        outer_loop_calls += 1;
        self.budget.outer_loop.record(&self.costs.plan);
        self.events.emit(&EngineEvent::OuterPlan {
            calls: outer_loop_calls,
        });

        let mut history = vec![state.clone()];

        loop {
            attempt += 1;
            self.policy.initialize(&state).await?;
            self.environment.reset(&state).await?;
            debug!("Inner loop attempt {} starting", attempt);

            let status = self.run_inner(attempt, &mut state, &mut history, &mut logs).await?;

            let reason = match status {
                InnerStatus::Stable => {
                    let output = with_retry("evaluate", retries, || self.planner.evaluate(&state, &history)).await?;
                    outer_loop_calls += 1;
                    self.budget.outer_loop.record(&self.costs.evaluate);
                    self.events.emit(&EngineEvent::OuterEvaluate {
                        calls: outer_loop_calls,
                    });
                    info!(
                        "Exploration resolved after {} inner steps, {} replans",
                        logs.len(),
                        replans
                    );
                    self.events.emit(&EngineEvent::Stopped {
                        t: logs.len(),
                        reason: StopReason::Stable,
                    });
                    return Ok(ExplorationReport {
                        outcome: ExplorationOutcome::Resolved(output),
                        final_state: state,
                        history,
                        inner_steps: logs.len(),
                        logs,
                        outer_loop_calls,
                        replans,
                        stop_reason: StopReason::Stable,
                    });
                }
                InnerStatus::Exhausted(reason) => reason,
            };

            if self.budget.outer_loop.should_stop() {
                warn!("Outer budget exhausted after inner loop stopped ({})", reason);
                return Ok(self.unresolved(
                    format!("outer budget exhausted after {}", reason),
                    state,
                    history,
                    logs,
                    outer_loop_calls,
                    replans,
                    reason,
                ));
            }

            if replans >= self.config.max_replans {
                warn!("Replan limit {} reached after {}", self.config.max_replans, reason);
                return Ok(self.unresolved(
                    format!("replan limit reached after {}", reason),
                    state,
                    history,
                    logs,
                    outer_loop_calls,
                    replans,
                    reason,
                ));
            }

            let proposal = with_retry("replan", retries, || self.planner.replan(&state, &history)).await?;
            outer_loop_calls += 1;
            self.budget.outer_loop.record(&self.costs.replan);
            self.events.emit(&EngineEvent::OuterReplan {
                calls: outer_loop_calls,
                accepted: proposal.is_some(),
            });

            match proposal {
                Some(next) => {
                    replans += 1;
                    info!("Replan {} accepted after {}", replans, reason);
                    state = next;
                    history.push(state.clone());
                    self.budget.inner_loop.reset(None);
                }
                None => {
                    info!("Replan declined after {}", reason);
                    return Ok(self.unresolved(
                        format!("replan declined after {}", reason),
                        state,
                        history,
                        logs,
                        outer_loop_calls,
                        replans,
                        reason,
                    ));
                }
            }
        }
    }

    async fn run_inner(
        &mut self,
        attempt: usize,
        state: &mut S,
        history: &mut Vec<S>,
        logs: &mut Vec<StepLog<S, A>>,
    ) -> Result<InnerStatus> {
        let retries = self.config.retries;
        let policy_id = self.policy.id().to_string();
        let mut best: Option<f64> = None;
        let mut no_improvement = 0;

        for _ in 0..self.config.max_inner_steps {
            if self.budget.inner_loop.should_stop() {
                return Ok(InnerStatus::Exhausted(StopReason::BudgetExhausted));
            }
            let t = logs.len();

            let aggregate = self.probe_all(t, state).await?;
            let stable = self.policy.is_stable(state).await?;

            if stable {
                logs.push(
                    StepLog::new(t, state.clone(), self.probes.id(), policy_id.clone())
                        .with_inner(attempt, aggregate.pass, true)
                        .with_gauges(self.ladder.level(), self.budget.inner_loop.remaining()),
                );
                self.events.emit(&EngineEvent::StepComplete {
                    t,
                    ladder_level: self.ladder.level(),
                    failure: None,
                });
                return Ok(InnerStatus::Stable);
            }

            let action = crate::retry_phase!("decide", retries.decide, self.policy.decide(state, self.ladder.as_ref()))?;
            let next = crate::retry_phase!("apply", retries.apply, self.environment.apply(&action))?;
            let feedback = crate::retry_phase!("evaluate", retries.evaluate, self.evaluator.evaluate(state, &next))?;
            self.ladder.update(feedback);
            self.policy.adapt(feedback, self.ladder.as_ref()).await?;

            let step_cost = Cost::Scalar(self.policy.capabilities().cost.step);
            self.charge(t, &step_cost);
            self.events.emit(&EngineEvent::ActionTaken {
                t,
                policy: policy_id.clone(),
                feedback,
            });

            logs.push(
                StepLog::new(t, state.clone(), self.probes.id(), policy_id.clone())
                    .with_inner(attempt, aggregate.pass, false)
                    .complete(action, next.clone(), feedback)
                    .with_gauges(self.ladder.level(), self.budget.inner_loop.remaining()),
            );
            self.events.emit(&EngineEvent::StepComplete {
                t,
                ladder_level: self.ladder.level(),
                failure: None,
            });

            *state = next.clone();
            history.push(next);

            if best.is_none_or(|b| feedback > b) {
                best = Some(feedback);
                no_improvement = 0;
            } else {
                no_improvement += 1;
            }

            if let Some(termination) = &self.termination {
                let ctx = TerminationContext {
                    t,
                    budget_remaining: self.budget.inner_loop.remaining(),
                    no_improvement_steps: no_improvement,
                    last_feedback: Some(feedback),
                };
                if let Some(reason) = termination.should_stop(&ctx) {
                    debug!("Inner loop attempt {} stopped: {}", attempt, reason);
                    return Ok(InnerStatus::Exhausted(reason));
                }
            }
        }

        Ok(InnerStatus::Exhausted(StopReason::MaxSteps))
    }

    /// Test every probe, charge each declared cost, and aggregate.
    async fn probe_all(&mut self, t: usize, state: &S) -> Result<ProbeResult> {
        self.events.emit(&EngineEvent::ProbeStarted {
            t,
            probe: self.probes.id().to_string(),
        });
        let results = self.probes.test_each(state).await?;
        for cost in self.probes.costs() {
            if cost != 0.0 {
                self.charge(t, &Cost::Scalar(cost));
            }
        }
        let aggregate = ProbeResult::aggregate(results);
        self.events.emit(&EngineEvent::ProbeResult {
            t,
            probe: self.probes.id().to_string(),
            passed: aggregate.pass,
            reason: aggregate.reason.clone(),
        });
        Ok(aggregate)
    }

    fn charge(&mut self, t: usize, cost: &Cost) {
        self.budget.inner_loop.record(cost);
        self.events.emit(&EngineEvent::BudgetChanged {
            t,
            charged: cost.total(),
            remaining: self.budget.inner_loop.remaining(),
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn unresolved(
        &self,
        reason: String,
        final_state: S,
        history: Vec<S>,
        logs: Vec<StepLog<S, A>>,
        outer_loop_calls: usize,
        replans: usize,
        stop_reason: StopReason,
    ) -> ExplorationReport<S, A> {
        self.events.emit(&EngineEvent::Stopped {
            t: logs.len(),
            reason: StopReason::Unresolved(reason.clone()),
        });
        ExplorationReport {
            outcome: ExplorationOutcome::Unresolved { reason },
            final_state,
            history,
            inner_steps: logs.len(),
            logs,
            outer_loop_calls,
            replans,
            stop_reason,
        }
    }
}
