//! Strategy selection: which probe and which policy run next.
//!
//! The selector sees only declared metadata, never the components
//! themselves, and answers with indices into the candidate slices:
//! - Probe: cheapest probe that supports the failure, else the cheapest probe
//! - Policy: restrict to policies whose exploration window covers the ladder
//!   level (all policies if none do), then cheapest that handles the failure,
//!   else first whose id names the failure, else cheapest
//!
//! Ties on cost keep registration order, so identical inputs always
//! produce the identical selection.

use std::cmp::Ordering;

use crate::domain::FailureCategory;
use crate::policy::PolicyCapabilities;
use crate::probe::ProbeCapabilities;

/// A component's id together with its declared capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<C> {
    pub id: String,
    pub capabilities: C,
}

impl<C> Candidate<C> {
    pub fn new(id: impl Into<String>, capabilities: C) -> Self {
        Self {
            id: id.into(),
            capabilities,
        }
    }
}

pub type ProbeCandidate = Candidate<ProbeCapabilities>;
pub type PolicyCandidate = Candidate<PolicyCapabilities>;

/// Inputs to one selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub failure: FailureCategory,
    pub ladder_level: f64,
    pub budget_remaining: f64,
    pub probes: &'a [ProbeCandidate],
    pub policies: &'a [PolicyCandidate],
}

/// Indices of the chosen probe and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub probe: usize,
    pub policy: usize,
}

/// Chooses a probe/policy pair for the current situation.
pub trait StrategySelector: Send + Sync {
    /// `None` only when either candidate slice is empty.
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<Selection>;
}

/// Capability match first, declared cost as tie-break.
#[derive(Debug, Default, Clone, Copy)]
pub struct CapabilitySelector;

impl CapabilitySelector {
    pub fn new() -> Self {
        Self
    }

    /// Index of the probe to run for `failure`.
    pub fn select_probe(&self, probes: &[ProbeCandidate], failure: FailureCategory) -> Option<usize> {
        let order = sorted_by_cost(probes.len(), |i| probes[i].capabilities.cost);
        order
            .iter()
            .copied()
            .find(|&i| probes[i].capabilities.supports(failure))
            .or_else(|| order.first().copied())
    }

    /// Index of the policy to run for `failure` at `ladder_level`.
    pub fn select_policy(
        &self,
        policies: &[PolicyCandidate],
        failure: FailureCategory,
        ladder_level: f64,
    ) -> Option<usize> {
        let in_range: Vec<usize> = (0..policies.len())
            .filter(|&i| policies[i].capabilities.covers(ladder_level))
            .collect();
        let pool = if in_range.is_empty() {
            (0..policies.len()).collect()
        } else {
            in_range
        };

        let mut order = pool;
        order.sort_by(|&a, &b| {
            compare_cost(policies[a].capabilities.cost.step, policies[b].capabilities.cost.step)
        });

        let needle = normalize(failure.as_str());
        order
            .iter()
            .copied()
            .find(|&i| policies[i].capabilities.handles(failure))
            .or_else(|| order.iter().copied().find(|&i| normalize(&policies[i].id).contains(&needle)))
            .or_else(|| order.first().copied())
    }
}

impl StrategySelector for CapabilitySelector {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<Selection> {
        let probe = self.select_probe(ctx.probes, ctx.failure)?;
        let policy = self.select_policy(ctx.policies, ctx.failure, ctx.ladder_level)?;
        Some(Selection { probe, policy })
    }
}

/// Indices `0..len` stably sorted by ascending cost.
fn sorted_by_cost(len: usize, cost: impl Fn(usize) -> f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| compare_cost(cost(a), cost(b)));
    order
}

fn compare_cost(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Lowercase with separators removed, so `TooBroad`, `too-broad` and
/// `too_broad` all compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
