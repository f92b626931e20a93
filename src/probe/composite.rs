// Probe aggregation: run several probes over the same state and fold the verdicts

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::Result;
use crate::probe::traits::{Probe, ProbeCapabilities, ProbeResult};

/// A set of probes that passes iff every member passes.
///
/// Members are awaited together; no member may depend on another's outcome.
pub struct ProbeSet<S> {
    /// The member probes, in registration order
    probes: Vec<Box<dyn Probe<S>>>,
    /// Identifier of the aggregate
    id: String,
}

impl<S> ProbeSet<S>
where
    S: Sync,
{
    /// Create a new empty probe set
    pub fn new() -> Self {
        Self::with_id("all")
    }

    /// Create a new probe set with a custom id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            probes: Vec::new(),
            id: id.into(),
        }
    }

    /// Add a probe (builder pattern)
    pub fn with_probe(mut self, probe: impl Probe<S> + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    /// Add a boxed probe
    pub fn add_boxed(mut self, probe: Box<dyn Probe<S>>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn probe_ids(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.id()).collect()
    }

    /// Declared cost of each member, in registration order.
    pub fn costs(&self) -> Vec<f64> {
        self.probes.iter().map(|p| p.capabilities().cost).collect()
    }

    /// Run every member and return the individual results in registration order.
    pub async fn test_each(&self, state: &S) -> Result<Vec<ProbeResult>> {
        join_all(self.probes.iter().map(|probe| probe.test(state)))
            .await
            .into_iter()
            .collect()
    }
}

impl<S> Default for ProbeSet<S>
where
    S: Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Probe<S> for ProbeSet<S>
where
    S: Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn test(&self, state: &S) -> Result<ProbeResult> {
        Ok(ProbeResult::aggregate(self.test_each(state).await?))
    }

    /// Summed cost and the union of supported categories.
    fn capabilities(&self) -> ProbeCapabilities {
        let mut combined = ProbeCapabilities::default();
        for probe in &self.probes {
            let caps = probe.capabilities();
            combined.cost += caps.cost;
            for category in caps.supports {
                if !combined.supports.contains(&category) {
                    combined.supports.push(category);
                }
            }
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockProbe {
        id: String,
        fail_with: Option<String>,
        caps: ProbeCapabilities,
        calls: Arc<AtomicUsize>,
    }

    impl MockProbe {
        fn passing(id: &str) -> Self {
            Self {
                id: id.to_string(),
                fail_with: None,
                caps: ProbeCapabilities::default(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(id: &str, reason: &str) -> Self {
            Self {
                fail_with: Some(reason.to_string()),
                ..Self::passing(id)
            }
        }

        fn costing(mut self, cost: f64, supports: &[FailureCategory]) -> Self {
            self.caps = ProbeCapabilities::new(cost).supporting(supports.iter().copied());
            self
        }
    }

    #[async_trait]
    impl Probe<u32> for MockProbe {
        fn id(&self) -> &str {
            &self.id
        }

        async fn test(&self, _state: &u32) -> Result<ProbeResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match &self.fail_with {
                Some(reason) => ProbeResult::fail(reason.clone()),
                None => ProbeResult::pass(),
            })
        }

        fn capabilities(&self) -> ProbeCapabilities {
            self.caps.clone()
        }
    }

    #[test]
    fn test_probe_set_new() {
        let set: ProbeSet<u32> = ProbeSet::new();
        assert!(set.is_empty());
        assert_eq!(set.id(), "all");
    }

    #[tokio::test]
    async fn test_empty_set_passes() {
        let set: ProbeSet<u32> = ProbeSet::new();
        assert!(set.test(&0).await.unwrap().pass);
    }

    #[tokio::test]
    async fn test_all_pass() {
        let set: ProbeSet<u32> = ProbeSet::new()
            .with_probe(MockProbe::passing("a"))
            .with_probe(MockProbe::passing("b"));
        let result = set.test(&0).await.unwrap();
        assert!(result.pass);
        assert!(result.reason.is_none());
    }

    #[tokio::test]
    async fn test_failures_are_concatenated() {
        let set: ProbeSet<u32> = ProbeSet::new()
            .with_probe(MockProbe::failing("a", "no-hits"))
            .with_probe(MockProbe::passing("b"))
            .with_probe(MockProbe::failing("c", "entropy-low"));
        let result = set.test(&0).await.unwrap();
        assert!(!result.pass);
        assert_eq!(result.reason.as_deref(), Some("no-hits; entropy-low"));
    }

    #[tokio::test]
    async fn test_every_member_runs_even_after_failure() {
        let first = MockProbe::failing("a", "no-hits");
        let second = MockProbe::passing("b");
        let second_calls = second.calls.clone();

        let set: ProbeSet<u32> = ProbeSet::new().with_probe(first).with_probe(second);
        set.test(&0).await.unwrap();
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_preserves_order() {
        let set: ProbeSet<u32> = ProbeSet::new()
            .with_probe(MockProbe::failing("a", "first"))
            .with_probe(MockProbe::failing("b", "second"));
        let results = set.test_each(&0).await.unwrap();
        assert_eq!(results[0].reason.as_deref(), Some("first"));
        assert_eq!(results[1].reason.as_deref(), Some("second"));
    }

    #[test]
    fn test_capabilities_sum_and_union() {
        let set: ProbeSet<u32> = ProbeSet::new()
            .with_probe(MockProbe::passing("a").costing(1.0, &[FailureCategory::NoData]))
            .with_probe(
                MockProbe::passing("b").costing(0.5, &[FailureCategory::NoData, FailureCategory::TooBroad]),
            );
        let caps = set.capabilities();
        assert_eq!(caps.cost, 1.5);
        assert_eq!(caps.supports, vec![FailureCategory::NoData, FailureCategory::TooBroad]);
        assert_eq!(set.costs(), vec![1.0, 0.5]);
    }

    #[test]
    fn test_probe_ids() {
        let set: ProbeSet<u32> = ProbeSet::with_id("gate")
            .with_probe(MockProbe::passing("first"))
            .add_boxed(Box::new(MockProbe::passing("second")));
        assert_eq!(set.probe_ids(), vec!["first", "second"]);
        assert_eq!(set.id(), "gate");
        assert_eq!(set.len(), 2);
    }
}
