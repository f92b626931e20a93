//! Query refinement as an environment.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::demo::corpus::{Corpus, Query};
use crate::environment::{Environment, Evaluator};
use crate::error::Result;

/// One edit to the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefineAction {
    /// Drop the last term
    Broaden,
    /// Add a term
    Narrow { term: String },
    /// Replace one term with another
    Rephrase { from: String, to: String },
}

impl fmt::Display for RefineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broaden => write!(f, "broaden"),
            Self::Narrow { term } => write!(f, "narrow +{}", term),
            Self::Rephrase { from, to } => write!(f, "rephrase {} -> {}", from, to),
        }
    }
}

/// Holds the current query and re-runs it against the corpus on every edit.
pub struct CorpusEnvironment {
    corpus: Arc<Corpus>,
    query: Query,
}

impl CorpusEnvironment {
    pub fn new(corpus: Arc<Corpus>, text: &str) -> Self {
        let query = corpus.query_text(text);
        Self { corpus, query }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    fn refine(&self, action: &RefineAction) -> Vec<String> {
        let mut terms = self.query.terms.clone();
        match action {
            RefineAction::Broaden => {
                terms.pop();
            }
            RefineAction::Narrow { term } => {
                if !self.query.has_term(term) {
                    terms.push(term.clone());
                }
            }
            RefineAction::Rephrase { from, to } => {
                for t in terms.iter_mut().filter(|t| t.as_str() == from.as_str()) {
                    *t = to.clone();
                }
            }
        }
        terms
    }
}

#[async_trait]
impl Environment<Query, RefineAction> for CorpusEnvironment {
    async fn observe(&self) -> Result<Query> {
        Ok(self.query.clone())
    }

    async fn apply(&mut self, action: &RefineAction) -> Result<Query> {
        let terms = self.refine(action);
        self.query = self.corpus.query(terms);
        log::debug!("{} -> \"{}\" ({} hits)", action, self.query.text(), self.query.hits);
        Ok(self.query.clone())
    }

    async fn reset(&mut self, state: &Query) -> Result<()> {
        self.query = self.corpus.query(state.terms.clone());
        Ok(())
    }
}

/// Rewards moving the hit count toward a target.
///
/// Feedback is the reduction in `|hits - target|`, scaled by the target.
#[derive(Debug, Clone, Copy)]
pub struct HitTargetEvaluator {
    target: f64,
}

impl HitTargetEvaluator {
    pub fn new(target: f64) -> Self {
        Self { target }
    }

    /// Aim for the middle of a hit band.
    pub fn for_band(min: usize, max: usize) -> Self {
        Self::new((min as f64 + max as f64) / 2.0)
    }

    fn distance(&self, query: &Query) -> f64 {
        (query.hits as f64 - self.target).abs() / self.target.max(1.0)
    }
}

#[async_trait]
impl Evaluator<Query> for HitTargetEvaluator {
    async fn evaluate(&self, prev: &Query, next: &Query) -> Result<f64> {
        Ok(self.distance(prev) - self.distance(next))
    }
}
