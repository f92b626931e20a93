//! Query refinement over an in-memory corpus.
//!
//! A small but complete domain for the engine: the state is a conjunctive
//! keyword query, actions add, drop or swap terms, and probes check that the
//! hit count and topic spread sit inside a band. Used by the CLI and the
//! integration tests.

mod corpus;
mod environment;
mod planner;
mod policies;

use crate::domain::FailureCategory;
use crate::probe::{HITS, ProbeCapabilities, RangeProbe};

pub use corpus::{Corpus, Document, Query, TERMS, tokenize};
pub use environment::{CorpusEnvironment, HitTargetEvaluator, RefineAction};
pub use planner::KeywordPlanner;
pub use policies::{BandPolicy, BroadenPolicy, NarrowPolicy, RephrasePolicy};

/// Probes for the flat loop.
///
/// `band` is the cheap gate. The two recovery probes pass whenever there is
/// something to act on, so a band failure re-routes to a policy that can fix
/// it instead of ending the step.
pub fn flat_probes(min_hits: usize, max_hits: usize) -> Vec<RangeProbe> {
    vec![
        RangeProbe::hit_count(min_hits as f64, max_hits as f64)
            .with_id("band")
            .with_capabilities(ProbeCapabilities::new(0.1)),
        RangeProbe::new(TERMS, Some(1.0), None)
            .with_id("has-terms")
            .with_capabilities(
                ProbeCapabilities::new(0.2).supporting([FailureCategory::TooNarrow, FailureCategory::NoData]),
            ),
        RangeProbe::new(HITS, Some(1.0), None)
            .with_id("has-hits")
            .with_capabilities(ProbeCapabilities::new(0.2).supporting([FailureCategory::TooBroad])),
    ]
}
