//! Outer-loop planner for the query domain.

use std::sync::Arc;

use async_trait::async_trait;

use crate::demo::corpus::{Corpus, Query};
use crate::error::{ProbeloopError, Result};
use crate::runner::Planner;

/// Plans from the input's keywords; replans by dropping the rarest term.
pub struct KeywordPlanner {
    corpus: Arc<Corpus>,
}

impl KeywordPlanner {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }
}

#[async_trait]
impl Planner<Query> for KeywordPlanner {
    async fn plan(&self, input: &str) -> Result<Query> {
        let query = self.corpus.query_text(input);
        if query.terms.is_empty() {
            return Err(ProbeloopError::Planner(format!("no keywords in input: {:?}", input)));
        }
        Ok(query)
    }

    async fn evaluate(&self, state: &Query, history: &[Query]) -> Result<String> {
        Ok(format!(
            "\"{}\" matches {} document(s) [{}] after {} refinement(s)",
            state.text(),
            state.hits,
            state.matches.join(", "),
            history.len().saturating_sub(1)
        ))
    }

    async fn replan(&self, state: &Query, history: &[Query]) -> Result<Option<Query>> {
        if state.terms.len() < 2 {
            return Ok(None);
        }
        let Some(rarest) = state
            .terms
            .iter()
            .min_by_key(|term| self.corpus.document_frequency(term))
        else {
            return Ok(None);
        };
        let terms: Vec<String> = state.terms.iter().filter(|t| *t != rarest).cloned().collect();
        if history.iter().any(|past| past.terms == terms) {
            return Ok(None);
        }
        Ok(Some(self.corpus.query(terms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> (KeywordPlanner, Arc<Corpus>) {
        let corpus = Arc::new(Corpus::sample());
        (KeywordPlanner::new(corpus.clone()), corpus)
    }

    #[tokio::test]
    async fn test_plan_extracts_keywords() {
        let (planner, _) = planner();
        let query = planner.plan("Why does Rust rust?").await.unwrap();
        assert_eq!(query.terms, vec!["does", "rust"]);
        assert_eq!(query.hits, 0);

        assert!(planner.plan("a to of").await.is_err());
    }

    #[tokio::test]
    async fn test_replan_drops_rarest_term() {
        let (planner, corpus) = planner();
        let state = corpus.query_text("rust telescope");
        let next = planner.replan(&state, &[state.clone()]).await.unwrap().unwrap();
        assert_eq!(next.terms, vec!["rust"]);
        assert_eq!(next.hits, 8);
    }

    #[tokio::test]
    async fn test_replan_declines_single_term_or_repeat() {
        let (planner, corpus) = planner();
        let single = corpus.query_text("rust");
        assert!(planner.replan(&single, &[]).await.unwrap().is_none());

        let pair = corpus.query_text("rust telescope");
        let seen = corpus.query_text("rust");
        assert!(planner.replan(&pair, &[seen]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_evaluate_summarizes() {
        let (planner, corpus) = planner();
        let state = corpus.query_text("rust iron");
        let output = planner.evaluate(&state, &[state.clone(), state.clone()]).await.unwrap();
        assert_eq!(
            output,
            "\"rust iron\" matches 2 document(s) [doc-8, doc-9] after 1 refinement(s)"
        );
    }
}
