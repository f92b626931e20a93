//! Flat orchestrator: a probe-gated control loop over swappable strategies.
//!
//! Each step observes, asks the selector for a probe/policy pair, and tests
//! the state. A failing probe is classified and re-routed; a passing one
//! hands the observation to the control kernel. Budget and termination are
//! checked after every step.

use std::sync::Arc;

use log::{debug, info};

use crate::budget::BudgetTracker;
use crate::domain::{Cost, EngineEvent, FailureCategory, StepFailure, StepLog, StopReason};
use crate::environment::{Environment, Evaluator};
use crate::error::{ProbeloopError, Result};
use crate::events::{EventSink, NoopSink};
use crate::kernel::ControlKernel;
use crate::ladder::{ExplorationLadder, Ladder};
use crate::policy::{ActionCost, Policy};
use crate::probe::{Probe, ProbeResult};
use crate::runner::OrchestratorConfig;
use crate::scheduler::{
    CapabilitySelector, Candidate, ClassificationContext, FailureClassifier, FailureMetrics, PolicyCandidate,
    ProbeCandidate, RuleClassifier, Selection, SelectionContext, StrategySelector, TerminationContext,
    TerminationPolicy,
};

/// Result of a flat run.
#[derive(Debug, Clone)]
pub struct RunReport<S, A> {
    /// Latest state seen: the last transition target, or the last observation
    pub final_state: S,
    pub logs: Vec<StepLog<S, A>>,
    pub stop_reason: StopReason,
}

impl<S, A> RunReport<S, A> {
    /// Steps that ran a policy.
    pub fn action_steps(&self) -> usize {
        self.logs.iter().filter(|log| !log.is_failure()).count()
    }

    /// Steps that ended on a probe failure.
    pub fn failure_steps(&self) -> usize {
        self.logs.iter().filter(|log| log.is_failure()).count()
    }
}

/// Stagnation bookkeeping shared by a whole run.
#[derive(Debug, Default)]
struct Progress {
    best: Option<f64>,
    no_improvement: usize,
    last_feedback: Option<f64>,
}

impl Progress {
    fn record(&mut self, feedback: f64) {
        if self.best.is_none_or(|best| feedback > best) {
            self.best = Some(feedback);
            self.no_improvement = 0;
        } else {
            self.no_improvement += 1;
        }
        self.last_feedback = Some(feedback);
    }

    fn stall(&mut self) {
        self.no_improvement += 1;
    }
}

/// Runs the flat control loop.
pub struct Orchestrator<S, A> {
    environment: Box<dyn Environment<S, A>>,
    probes: Vec<Box<dyn Probe<S>>>,
    policies: Vec<Box<dyn Policy<S, A>>>,
    evaluator: Box<dyn Evaluator<S>>,
    budget: Box<dyn BudgetTracker>,
    ladder: Box<dyn Ladder>,
    selector: Box<dyn StrategySelector>,
    classifier: Box<dyn FailureClassifier<S, A>>,
    termination: Option<Box<dyn TerminationPolicy>>,
    action_cost: Option<Box<dyn ActionCost<A>>>,
    events: Arc<dyn EventSink>,
    config: OrchestratorConfig,
}

impl<S, A> Orchestrator<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// Create an orchestrator with no strategies registered yet.
    ///
    /// At least one probe and one policy must be added before `run`.
    pub fn new(
        environment: impl Environment<S, A> + 'static,
        evaluator: impl Evaluator<S> + 'static,
        budget: impl BudgetTracker + 'static,
    ) -> Self {
        Self {
            environment: Box::new(environment),
            probes: Vec::new(),
            policies: Vec::new(),
            evaluator: Box::new(evaluator),
            budget: Box::new(budget),
            ladder: Box::new(ExplorationLadder::new()),
            selector: Box::new(CapabilitySelector::new()),
            classifier: Box::new(RuleClassifier::new()),
            termination: None,
            action_cost: None,
            events: Arc::new(NoopSink),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_probe(mut self, probe: impl Probe<S> + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    pub fn add_boxed_probe(mut self, probe: Box<dyn Probe<S>>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn with_policy(mut self, policy: impl Policy<S, A> + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn add_boxed_policy(mut self, policy: Box<dyn Policy<S, A>>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn with_ladder(mut self, ladder: impl Ladder + 'static) -> Self {
        self.ladder = Box::new(ladder);
        self
    }

    pub fn with_selector(mut self, selector: impl StrategySelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn with_classifier(mut self, classifier: impl FailureClassifier<S, A> + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_termination(mut self, termination: impl TerminationPolicy + 'static) -> Self {
        self.termination = Some(Box::new(termination));
        self
    }

    /// Override per-action costs. Policies' declared step cost is the fallback.
    pub fn with_action_cost(mut self, cost: impl ActionCost<A> + 'static) -> Self {
        self.action_cost = Some(Box::new(cost));
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

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn ladder_level(&self) -> f64 {
        self.ladder.level()
    }

    pub fn budget_remaining(&self) -> f64 {
        self.budget.remaining()
    }

    /// Run until the budget, a termination rule, or `max_steps` ends it.
    pub async fn run(&mut self) -> Result<RunReport<S, A>> {
        if self.probes.is_empty() {
            return Err(ProbeloopError::Config("orchestrator needs at least one probe".into()));
        }
        if self.policies.is_empty() {
            return Err(ProbeloopError::Config("orchestrator needs at least one policy".into()));
        }

        let probe_candidates: Vec<ProbeCandidate> = self
            .probes
            .iter()
            .map(|probe| Candidate::new(probe.id(), probe.capabilities()))
            .collect();
        let policy_candidates: Vec<PolicyCandidate> = self
            .policies
            .iter()
            .map(|policy| Candidate::new(policy.id(), policy.capabilities()))
            .collect();

        let kernel = ControlKernel::with_retries(self.config.retries);
        let mut logs: Vec<StepLog<S, A>> = Vec::new();
        let mut progress = Progress::default();
        let mut final_state: Option<S> = None;
        let mut stop_reason = StopReason::MaxSteps;
        let mut last_t = 0;

        info!(
            "Starting run: {} probes, {} policies, budget {:.2}, max {} steps",
            self.probes.len(),
            self.policies.len(),
            self.budget.remaining(),
            self.config.max_steps
        );

        for t in 0..self.config.max_steps {
            last_t = t;
            let state = crate::retry_phase!("observe", self.config.retries.observe, self.environment.observe())?;

            let mut selection = self.select(FailureCategory::Unknown, &probe_candidates, &policy_candidates)?;
            let mut verdict = self.run_probe(t, selection.probe, &state).await?;
            let mut failure: Option<StepFailure> = None;

            if !verdict.pass {
                let mut category = self.classify(&state, &verdict, progress.last_feedback);
                let mut rounds = 0;
                while !verdict.pass && rounds < self.config.reselection_rounds {
                    let next = self.select(category, &probe_candidates, &policy_candidates)?;
                    if next != selection {
                        self.announce_switch(t, category, selection, next, &probe_candidates, &policy_candidates);
                    }
                    selection = next;
                    verdict = self.run_probe(t, selection.probe, &state).await?;
                    if !verdict.pass {
                        category = self.classify(&state, &verdict, progress.last_feedback);
                    }
                    rounds += 1;
                }

                if !verdict.pass {
                    failure = Some(StepFailure::new(category, verdict.reason_or_empty()));
                } else if self.budget.should_stop() {
                    failure = Some(StepFailure::new(category, StopReason::BudgetExhausted.as_str()));
                }
            }

            let probe_id = probe_candidates[selection.probe].id.clone();
            let policy_id = policy_candidates[selection.policy].id.clone();

            let failure_category = failure.as_ref().map(|f| f.category);
            if let Some(failure) = failure {
                debug!("Step {} failed: {} ({})", t, failure.category, failure.reason);
                progress.stall();
                logs.push(
                    StepLog::new(t, state.clone(), probe_id, policy_id)
                        .with_failure(failure)
                        .with_gauges(self.ladder.level(), self.budget.remaining()),
                );
                final_state = Some(state);
            } else {
                let step = kernel
                    .step(
                        Some(state),
                        self.environment.as_mut(),
                        self.policies[selection.policy].as_mut(),
                        self.evaluator.as_ref(),
                        self.ladder.as_mut(),
                    )
                    .await?;

                let cost = self.cost_of(selection.policy, &step.action);
                self.charge(t, &cost);
                self.events.emit(&EngineEvent::ActionTaken {
                    t,
                    policy: policy_id.clone(),
                    feedback: step.feedback,
                });
                progress.record(step.feedback);

                final_state = Some(step.next.clone());
                logs.push(
                    StepLog::new(t, step.state, probe_id, policy_id)
                        .complete(step.action, step.next, step.feedback)
                        .with_gauges(self.ladder.level(), self.budget.remaining()),
                );
            }

            self.events.emit(&EngineEvent::StepComplete {
                t,
                ladder_level: self.ladder.level(),
                failure: failure_category,
            });

            if self.budget.should_stop() {
                stop_reason = StopReason::BudgetExhausted;
                break;
            }

            if let Some(termination) = &self.termination {
                let ctx = TerminationContext {
                    t,
                    budget_remaining: self.budget.remaining(),
                    no_improvement_steps: progress.no_improvement,
                    last_feedback: progress.last_feedback,
                };
                if let Some(reason) = termination.should_stop(&ctx) {
                    stop_reason = reason;
                    break;
                }
            }
        }

        let final_state = match final_state {
            Some(state) => state,
            None => crate::retry_phase!("observe", self.config.retries.observe, self.environment.observe())?,
        };

        info!("Run stopped after {} steps: {}", logs.len(), stop_reason);
        self.events.emit(&EngineEvent::Stopped {
            t: last_t,
            reason: stop_reason.clone(),
        });

        Ok(RunReport {
            final_state,
            logs,
            stop_reason,
        })
    }

    fn select(
        &self,
        failure: FailureCategory,
        probes: &[ProbeCandidate],
        policies: &[PolicyCandidate],
    ) -> Result<Selection> {
        let ctx = SelectionContext {
            failure,
            ladder_level: self.ladder.level(),
            budget_remaining: self.budget.remaining(),
            probes,
            policies,
        };
        let selection = self
            .selector
            .select(&ctx)
            .ok_or_else(|| ProbeloopError::InvalidState(format!("no strategy selected for {}", failure)))?;
        if selection.probe >= probes.len() || selection.policy >= policies.len() {
            return Err(ProbeloopError::InvalidState(format!(
                "selector returned out-of-range selection {:?}",
                selection
            )));
        }
        Ok(selection)
    }

    async fn run_probe(&mut self, t: usize, index: usize, state: &S) -> Result<ProbeResult> {
        let probe = &self.probes[index];
        let probe_id = probe.id().to_string();
        let cost = probe.capabilities().cost;

        self.events.emit(&EngineEvent::ProbeStarted {
            t,
            probe: probe_id.clone(),
        });
        let verdict = probe.test(state).await?;
        self.events.emit(&EngineEvent::ProbeResult {
            t,
            probe: probe_id,
            passed: verdict.pass,
            reason: verdict.reason.clone(),
        });

        if cost != 0.0 {
            self.charge(t, &Cost::Scalar(cost));
        }
        Ok(verdict)
    }

    fn classify(&self, state: &S, verdict: &ProbeResult, last_feedback: Option<f64>) -> FailureCategory {
        let metrics = FailureMetrics::from_probe_data(verdict.data.as_ref()).with_last_feedback(last_feedback);
        let ctx: ClassificationContext<'_, S, A> =
            ClassificationContext::for_probe(state, verdict.reason.as_deref(), metrics);
        self.classifier.classify(&ctx)
    }

    fn cost_of(&self, policy: usize, action: &A) -> Cost {
        self.action_cost
            .as_ref()
            .and_then(|cost| cost.cost(action))
            .unwrap_or_else(|| Cost::Scalar(self.policies[policy].capabilities().cost.step))
    }

    fn charge(&mut self, t: usize, cost: &Cost) {
        self.budget.record(cost);
        self.events.emit(&EngineEvent::BudgetChanged {
            t,
            charged: cost.total(),
            remaining: self.budget.remaining(),
        });
    }

    fn announce_switch(
        &self,
        t: usize,
        failure: FailureCategory,
        from: Selection,
        to: Selection,
        probes: &[ProbeCandidate],
        policies: &[PolicyCandidate],
    ) {
        info!(
            "Step {}: {} -> switching {}/{} to {}/{}",
            t, failure, probes[from.probe].id, policies[from.policy].id, probes[to.probe].id, policies[to.policy].id
        );
        self.events.emit(&EngineEvent::StrategySwitch {
            t,
            failure,
            from_probe: probes[from.probe].id.clone(),
            to_probe: probes[to.probe].id.clone(),
            from_policy: policies[from.policy].id.clone(),
            to_policy: policies[to.policy].id.clone(),
        });
    }
}
