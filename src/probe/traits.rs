// Probe interface: cheap feasibility gates run before committing to a step

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::FailureCategory;
use crate::error::Result;

/// Result of a probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Whether the state is feasible
    pub pass: bool,
    /// Diagnostic for the failure classifier
    pub reason: Option<String>,
    /// Probe-specific payload (metric values, counts, ...)
    pub data: Option<Value>,
}

impl ProbeResult {
    /// Create a passing result
    pub fn pass() -> Self {
        Self {
            pass: true,
            reason: None,
            data: None,
        }
    }

    /// Create a failing result with a reason
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            pass: false,
            reason: Some(reason.into()),
            data: None,
        }
    }

    /// Attach a payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Reason text, empty when none was given
    pub fn reason_or_empty(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }

    /// Merge another result into this one.
    ///
    /// Fails if either fails; reasons are joined with `"; "`; object payloads
    /// are merged key by key (later keys win).
    pub fn merge(&mut self, other: ProbeResult) {
        if !other.pass {
            self.pass = false;
        }
        if let Some(reason) = other.reason {
            self.reason = Some(match self.reason.take() {
                Some(existing) if !existing.is_empty() => format!("{}; {}", existing, reason),
                _ => reason,
            });
        }
        self.data = match (self.data.take(), other.data) {
            (Some(Value::Object(mut mine)), Some(Value::Object(theirs))) => {
                mine.extend(theirs);
                Some(Value::Object(mine))
            }
            (None, theirs) => theirs,
            (mine, None) => mine,
            (_, theirs) => theirs,
        };
    }

    /// Fold results into one: pass iff all pass.
    pub fn aggregate(results: impl IntoIterator<Item = ProbeResult>) -> Self {
        let mut combined = ProbeResult::pass();
        for result in results {
            combined.merge(result);
        }
        combined
    }
}

impl Default for ProbeResult {
    fn default() -> Self {
        Self::pass()
    }
}

/// Routing and accounting metadata a probe declares about itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeCapabilities {
    /// Cost charged after each test (0 = free, never recorded)
    pub cost: f64,
    /// Failure categories this probe is good at diagnosing
    pub supports: Vec<FailureCategory>,
}

impl ProbeCapabilities {
    pub fn new(cost: f64) -> Self {
        Self {
            cost,
            supports: Vec::new(),
        }
    }

    pub fn supporting(mut self, categories: impl IntoIterator<Item = FailureCategory>) -> Self {
        self.supports.extend(categories);
        self
    }

    pub fn supports(&self, category: FailureCategory) -> bool {
        self.supports.contains(&category)
    }
}

/// Named numeric readings a state exposes to threshold probes.
pub trait ProbeMetrics {
    fn metric(&self, name: &str) -> Option<f64>;
}

/// Cheap, side-effect-free feasibility check over a state.
#[async_trait]
pub trait Probe<S>: Send + Sync {
    /// Stable identifier used in logs and routing
    fn id(&self) -> &str;

    /// Test the state. Must not mutate it or call expensive services.
    async fn test(&self, state: &S) -> Result<ProbeResult>;

    fn capabilities(&self) -> ProbeCapabilities {
        ProbeCapabilities::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probe_result_pass() {
        let result = ProbeResult::pass();
        assert!(result.pass);
        assert!(result.reason.is_none());
        assert!(result.data.is_none());
    }

    #[test]
    fn test_probe_result_fail() {
        let result = ProbeResult::fail("no-hits");
        assert!(!result.pass);
        assert_eq!(result.reason_or_empty(), "no-hits");
    }

    #[test]
    fn test_merge_passing() {
        let mut result = ProbeResult::pass().with_data(json!({"hits": 4.0}));
        result.merge(ProbeResult::pass().with_data(json!({"entropy": 0.5})));
        assert!(result.pass);
        assert_eq!(result.data, Some(json!({"hits": 4.0, "entropy": 0.5})));
    }

    #[test]
    fn test_merge_concatenates_reasons() {
        let mut result = ProbeResult::fail("no-hits");
        result.merge(ProbeResult::pass());
        result.merge(ProbeResult::fail("entropy-low"));
        assert!(!result.pass);
        assert_eq!(result.reason_or_empty(), "no-hits; entropy-low");
    }

    #[test]
    fn test_aggregate_empty_passes() {
        let result = ProbeResult::aggregate(Vec::new());
        assert!(result.pass);
    }

    #[test]
    fn test_aggregate_one_failing() {
        let result = ProbeResult::aggregate(vec![
            ProbeResult::pass(),
            ProbeResult::fail("too-many-hits"),
            ProbeResult::pass(),
        ]);
        assert!(!result.pass);
        assert_eq!(result.reason_or_empty(), "too-many-hits");
    }

    #[test]
    fn test_capabilities_default() {
        let caps = ProbeCapabilities::default();
        assert_eq!(caps.cost, 0.0);
        assert!(caps.supports.is_empty());
    }

    #[test]
    fn test_capabilities_supporting() {
        let caps = ProbeCapabilities::new(2.0).supporting([FailureCategory::NoData]);
        assert!(caps.supports(FailureCategory::NoData));
        assert!(!caps.supports(FailureCategory::TooBroad));
    }

    struct AlwaysFails;

    #[async_trait]
    impl Probe<u32> for AlwaysFails {
        fn id(&self) -> &str {
            "always-fails"
        }

        async fn test(&self, _state: &u32) -> Result<ProbeResult> {
            Ok(ProbeResult::fail("infeasible"))
        }
    }

    #[tokio::test]
    async fn test_probe_trait_default_capabilities() {
        let probe = AlwaysFails;
        let result = probe.test(&1).await.unwrap();
        assert!(!result.pass);
        assert_eq!(probe.capabilities(), ProbeCapabilities::default());
    }
}
