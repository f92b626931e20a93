//! Threshold-style probes.
//!
//! A [`RangeProbe`] reads one named metric from the state and checks it
//! against optional bounds. Failure reasons are fixed tokens so the
//! failure classifier can route on them without parsing free text.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::FailureCategory;
use crate::error::Result;
use crate::probe::traits::{Probe, ProbeCapabilities, ProbeMetrics, ProbeResult};

/// Reason reported when the state does not expose the metric.
pub const MISSING_METRIC: &str = "missing-metric";

/// Metric name read by [`RangeProbe::hit_count`].
pub const HITS: &str = "hits";

/// Metric name read by [`RangeProbe::entropy`].
pub const ENTROPY: &str = "entropy";

/// "Value must lie in `[min, max]`".
#[derive(Debug, Clone)]
pub struct RangeProbe {
    id: String,
    metric: String,
    min: Option<f64>,
    max: Option<f64>,
    low_reason: String,
    high_reason: String,
    zero_reason: Option<String>,
    capabilities: ProbeCapabilities,
}

impl RangeProbe {
    /// Generic range probe; reasons default to `<metric>-low` / `<metric>-high`.
    pub fn new(metric: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        let metric = metric.into();
        Self {
            id: format!("{}-range", metric),
            low_reason: format!("{}-low", metric),
            high_reason: format!("{}-high", metric),
            metric,
            min,
            max,
            zero_reason: None,
            capabilities: ProbeCapabilities::default(),
        }
    }

    /// Hit-count window: `no-hits`, `too-few-hits`, `too-many-hits`.
    pub fn hit_count(min: f64, max: f64) -> Self {
        Self::new(HITS, Some(min), Some(max))
            .with_id("hit-count")
            .with_reasons("too-few-hits", "too-many-hits")
            .with_zero_reason("no-hits")
            .with_capabilities(ProbeCapabilities::default().supporting([
                FailureCategory::NoData,
                FailureCategory::TooNarrow,
                FailureCategory::TooBroad,
            ]))
    }

    /// Entropy window: `entropy-low`, `entropy-high`.
    pub fn entropy(min: f64, max: f64) -> Self {
        Self::new(ENTROPY, Some(min), Some(max))
            .with_id("entropy")
            .with_capabilities(
                ProbeCapabilities::default().supporting([FailureCategory::TooNarrow, FailureCategory::TooBroad]),
            )
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_reasons(mut self, low: impl Into<String>, high: impl Into<String>) -> Self {
        self.low_reason = low.into();
        self.high_reason = high.into();
        self
    }

    /// Reason used when the metric is exactly zero and zero is below range.
    pub fn with_zero_reason(mut self, reason: impl Into<String>) -> Self {
        self.zero_reason = Some(reason.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: ProbeCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.capabilities.cost = cost;
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Judge a raw value against the window.
    pub fn check(&self, value: f64) -> ProbeResult {
        let mut reading = Map::new();
        reading.insert(self.metric.clone(), Value::from(value));
        let data = Value::Object(reading);

        if let Some(min) = self.min
            && value < min
        {
            let reason = match &self.zero_reason {
                Some(zero) if value == 0.0 => zero.clone(),
                _ => self.low_reason.clone(),
            };
            return ProbeResult::fail(reason).with_data(data);
        }
        if let Some(max) = self.max
            && value > max
        {
            return ProbeResult::fail(self.high_reason.clone()).with_data(data);
        }
        ProbeResult::pass().with_data(data)
    }
}

#[async_trait]
impl<S> Probe<S> for RangeProbe
where
    S: ProbeMetrics + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn test(&self, state: &S) -> Result<ProbeResult> {
        Ok(match state.metric(&self.metric) {
            Some(value) => self.check(value),
            None => ProbeResult::fail(MISSING_METRIC),
        })
    }

    fn capabilities(&self) -> ProbeCapabilities {
        self.capabilities.clone()
    }
}
