//! Refinement policies for the query domain.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::demo::corpus::{Corpus, Query};
use crate::demo::environment::RefineAction;
use crate::domain::FailureCategory;
use crate::error::Result;
use crate::ladder::Ladder;
use crate::policy::{Policy, PolicyCapabilities, ProbePolicy};

/// Drops the most recent term.
#[derive(Debug, Clone, Default)]
pub struct BroadenPolicy;

#[async_trait]
impl Policy<Query, RefineAction> for BroadenPolicy {
    fn id(&self) -> &str {
        "broaden"
    }

    async fn decide(&self, _state: &Query, _ladder: &dyn Ladder) -> Result<RefineAction> {
        Ok(RefineAction::Broaden)
    }

    fn capabilities(&self) -> PolicyCapabilities {
        PolicyCapabilities::default().handling([FailureCategory::TooNarrow, FailureCategory::NoData])
    }
}

/// Adds a co-occurring term.
///
/// At ladder level 0 the most common candidate is picked; each full ladder
/// step moves one rank down the list toward rarer, more aggressive cuts.
pub struct NarrowPolicy {
    corpus: Arc<Corpus>,
}

impl NarrowPolicy {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }
}

#[async_trait]
impl Policy<Query, RefineAction> for NarrowPolicy {
    fn id(&self) -> &str {
        "narrow"
    }

    async fn decide(&self, state: &Query, ladder: &dyn Ladder) -> Result<RefineAction> {
        let candidates = self.corpus.narrowing_terms(state);
        if candidates.is_empty() {
            return Ok(RefineAction::Broaden);
        }
        let rank = (ladder.level().max(0.0) as usize).min(candidates.len() - 1);
        Ok(RefineAction::Narrow {
            term: candidates[rank].clone(),
        })
    }

    fn capabilities(&self) -> PolicyCapabilities {
        PolicyCapabilities::default().handling([FailureCategory::TooBroad])
    }
}

/// Swaps a term for a configured alternative.
pub struct RephrasePolicy {
    synonyms: BTreeMap<String, String>,
}

impl RephrasePolicy {
    pub fn new(synonyms: BTreeMap<String, String>) -> Self {
        Self { synonyms }
    }

    /// Alternatives that fit the sample corpus.
    pub fn sample() -> Self {
        let pairs = [
            ("rust", "oxide"),
            ("oxide", "iron"),
            ("async", "concurrency"),
            ("tomatoes", "garlic"),
            ("telescope", "moons"),
        ];
        Self::new(pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect())
    }
}

#[async_trait]
impl Policy<Query, RefineAction> for RephrasePolicy {
    fn id(&self) -> &str {
        "rephrase"
    }

    async fn decide(&self, state: &Query, _ladder: &dyn Ladder) -> Result<RefineAction> {
        let swap = state
            .terms
            .iter()
            .rev()
            .find_map(|term| self.synonyms.get(term).map(|to| (term.clone(), to.clone())));
        Ok(match swap {
            Some((from, to)) => RefineAction::Rephrase { from, to },
            None => RefineAction::Broaden,
        })
    }

    fn capabilities(&self) -> PolicyCapabilities {
        PolicyCapabilities::default().handling([FailureCategory::Infeasible])
    }
}

/// Steers the hit count into `[min_hits, max_hits]`; stable once inside.
///
/// Remembers setbacks within one attempt so a narrowing term that made
/// things worse is not proposed again.
pub struct BandPolicy {
    corpus: Arc<Corpus>,
    min_hits: usize,
    max_hits: usize,
    setbacks: usize,
}

impl BandPolicy {
    pub fn new(corpus: Arc<Corpus>, min_hits: usize, max_hits: usize) -> Self {
        Self {
            corpus,
            min_hits,
            max_hits,
            setbacks: 0,
        }
    }

    pub fn setbacks(&self) -> usize {
        self.setbacks
    }
}

#[async_trait]
impl Policy<Query, RefineAction> for BandPolicy {
    fn id(&self) -> &str {
        "band"
    }

    async fn decide(&self, state: &Query, ladder: &dyn Ladder) -> Result<RefineAction> {
        if state.hits < self.min_hits {
            return Ok(RefineAction::Broaden);
        }
        let candidates = self.corpus.narrowing_terms(state);
        if candidates.is_empty() {
            return Ok(RefineAction::Broaden);
        }
        let rank = (self.setbacks + ladder.level().max(0.0) as usize).min(candidates.len() - 1);
        Ok(RefineAction::Narrow {
            term: candidates[rank].clone(),
        })
    }

    async fn adapt(&mut self, feedback: f64, _ladder: &dyn Ladder) -> Result<()> {
        if feedback < 0.0 {
            self.setbacks += 1;
        }
        Ok(())
    }

    fn capabilities(&self) -> PolicyCapabilities {
        PolicyCapabilities::default().handling([FailureCategory::TooBroad, FailureCategory::TooNarrow])
    }
}

#[async_trait]
impl ProbePolicy<Query, RefineAction> for BandPolicy {
    async fn initialize(&mut self, _state: &Query) -> Result<()> {
        self.setbacks = 0;
        Ok(())
    }

    async fn is_stable(&self, state: &Query) -> Result<bool> {
        Ok((self.min_hits..=self.max_hits).contains(&state.hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::ExplorationLadder;

    fn corpus() -> Arc<Corpus> {
        Arc::new(Corpus::sample())
    }

    #[tokio::test]
    async fn test_narrow_picks_most_common_term() {
        let corpus = corpus();
        let rust = corpus.query_text("rust");
        let action = NarrowPolicy::new(corpus.clone())
            .decide(&rust, &ExplorationLadder::new())
            .await
            .unwrap();
        assert_eq!(action, RefineAction::Narrow { term: "iron".into() });
    }

    #[tokio::test]
    async fn test_narrow_falls_back_to_broaden() {
        let corpus = corpus();
        let single = corpus.query_text("tokio");
        let action = NarrowPolicy::new(corpus.clone())
            .decide(&single, &ExplorationLadder::new())
            .await
            .unwrap();
        assert_eq!(action, RefineAction::Broaden);
    }

    #[tokio::test]
    async fn test_rephrase_uses_latest_known_term() {
        let corpus = corpus();
        let query = corpus.query_text("rust tomatoes");
        let action = RephrasePolicy::sample()
            .decide(&query, &ExplorationLadder::new())
            .await
            .unwrap();
        assert_eq!(
            action,
            RefineAction::Rephrase {
                from: "tomatoes".into(),
                to: "garlic".into()
            }
        );

        let unknown = corpus.query_text("balcony");
        let action = RephrasePolicy::sample()
            .decide(&unknown, &ExplorationLadder::new())
            .await
            .unwrap();
        assert_eq!(action, RefineAction::Broaden);
    }

    #[tokio::test]
    async fn test_band_policy_stability_and_memory() {
        let corpus = corpus();
        let mut policy = BandPolicy::new(corpus.clone(), 2, 4);
        let ladder = ExplorationLadder::new();

        assert!(!policy.is_stable(&corpus.query_text("rust")).await.unwrap());
        assert!(policy.is_stable(&corpus.query_text("rust iron")).await.unwrap());
        assert!(!policy.is_stable(&corpus.query_text("telescope")).await.unwrap());

        policy.adapt(-0.5, &ladder).await.unwrap();
        policy.adapt(0.5, &ladder).await.unwrap();
        assert_eq!(policy.setbacks(), 1);

        let action = policy.decide(&corpus.query_text("rust"), &ladder).await.unwrap();
        assert_ne!(action, RefineAction::Narrow { term: "iron".into() });

        policy.initialize(&corpus.query_text("rust")).await.unwrap();
        assert_eq!(policy.setbacks(), 0);
        let action = policy.decide(&corpus.query_text("rust"), &ladder).await.unwrap();
        assert_eq!(action, RefineAction::Narrow { term: "iron".into() });
    }

    #[tokio::test]
    async fn test_band_policy_broadens_below_band() {
        let corpus = corpus();
        let policy = BandPolicy::new(corpus.clone(), 2, 4);
        let action = policy
            .decide(&corpus.query_text("rust fungus"), &ExplorationLadder::new())
            .await
            .unwrap();
        assert_eq!(action, RefineAction::Broaden);
    }

    #[test]
    fn test_capabilities_route_by_failure() {
        assert!(BroadenPolicy.capabilities().handles(FailureCategory::NoData));
        assert!(NarrowPolicy::new(corpus()).capabilities().handles(FailureCategory::TooBroad));
        assert!(!RephrasePolicy::sample().capabilities().handles(FailureCategory::TooBroad));
    }
}
