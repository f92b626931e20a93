//! Failure classification.
//!
//! Maps a probe's failure reason plus ambient metrics onto one
//! [`FailureCategory`]. Reason keywords are checked first, then metric
//! thresholds; anything else is `Unknown`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::FailureCategory;
use crate::probe::{ENTROPY, HITS};

/// Keyword table, checked in order. Rate limits come before the
/// "too-many" family so `too many requests` is not read as too broad.
/// Keywords match whole words only; status codes need an `http`/`status` prefix.
const REASON_KEYWORDS: &[(FailureCategory, &[&str])] = &[
    (
        FailureCategory::RateLimited,
        &[
            "rate-limit",
            "rate-limited",
            "rate limit",
            "rate limited",
            "ratelimit",
            "ratelimited",
            "too many requests",
            "http 429",
            "status 429",
        ],
    ),
    (
        FailureCategory::AuthDenied,
        &[
            "auth",
            "authentication",
            "unauthorized",
            "unauthenticated",
            "forbidden",
            "permission denied",
            "http 401",
            "status 401",
            "http 403",
            "status 403",
        ],
    ),
    (
        FailureCategory::ToolMissing,
        &["tool-missing", "missing-tool", "tool missing", "missing tool", "command not found", "not installed"],
    ),
    (
        FailureCategory::Infeasible,
        &["infeasible", "impossible", "unsatisfiable"],
    ),
    (
        FailureCategory::NoData,
        &["no-hits", "no hits", "no-data", "no data", "empty", "missing-metric"],
    ),
    (
        FailureCategory::TooBroad,
        &["too-many", "too many", "entropy-high", "too-broad", "too broad"],
    ),
    (
        FailureCategory::TooNarrow,
        &["too-few", "too few", "entropy-low", "too-narrow", "too narrow"],
    ),
];

/// Keyword-only classification of a probe reason.
///
/// Returns `None` when no keyword matches.
pub fn classify_reason(reason: &str) -> Option<FailureCategory> {
    let reason = reason.to_lowercase();
    REASON_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_word(&reason, k)))
        .map(|(category, _)| *category)
}

/// `needle` occurs in `haystack` with no alphanumeric neighbour on either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Numeric signals available when classifying.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FailureMetrics {
    pub hits: Option<f64>,
    pub entropy: Option<f64>,
    pub last_feedback: Option<f64>,
}

impl FailureMetrics {
    /// Read `hits` / `entropy` from a probe payload object.
    pub fn from_probe_data(data: Option<&Value>) -> Self {
        let read = |key: &str| data.and_then(|d| d.get(key)).and_then(Value::as_f64);
        Self {
            hits: read(HITS),
            entropy: read(ENTROPY),
            last_feedback: None,
        }
    }

    pub fn with_last_feedback(mut self, feedback: Option<f64>) -> Self {
        self.last_feedback = feedback;
        self
    }
}

/// Everything a classifier may look at.
#[derive(Debug)]
pub struct ClassificationContext<'a, S, A> {
    pub prev: &'a S,
    pub next: Option<&'a S>,
    pub action: Option<&'a A>,
    pub probe_reason: Option<&'a str>,
    pub metrics: FailureMetrics,
}

impl<'a, S, A> ClassificationContext<'a, S, A> {
    pub fn for_probe(state: &'a S, reason: Option<&'a str>, metrics: FailureMetrics) -> Self {
        Self {
            prev: state,
            next: None,
            action: None,
            probe_reason: reason,
            metrics,
        }
    }
}

/// Maps a failure onto the closed category set.
pub trait FailureClassifier<S, A>: Send + Sync {
    fn classify(&self, ctx: &ClassificationContext<'_, S, A>) -> FailureCategory;
}

/// Keyword rules followed by metric thresholds. Unset thresholds are skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleClassifier {
    pub entropy_low: Option<f64>,
    pub entropy_high: Option<f64>,
    pub hits_low: Option<f64>,
    pub hits_high: Option<f64>,
}

impl RuleClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entropy_bounds(mut self, low: f64, high: f64) -> Self {
        self.entropy_low = Some(low);
        self.entropy_high = Some(high);
        self
    }

    pub fn with_hit_bounds(mut self, low: f64, high: f64) -> Self {
        self.hits_low = Some(low);
        self.hits_high = Some(high);
        self
    }

    fn classify_metrics(&self, metrics: &FailureMetrics) -> Option<FailureCategory> {
        if let Some(entropy) = metrics.entropy {
            if self.entropy_high.is_some_and(|high| entropy > high) {
                return Some(FailureCategory::TooBroad);
            }
            if self.entropy_low.is_some_and(|low| entropy < low) {
                return Some(FailureCategory::TooNarrow);
            }
        }
        if let Some(hits) = metrics.hits {
            if self.hits_high.is_some_and(|high| hits > high) {
                return Some(FailureCategory::TooBroad);
            }
            if self.hits_low.is_some_and(|low| hits < low) {
                return Some(FailureCategory::TooNarrow);
            }
        }
        None
    }
}

impl<S, A> FailureClassifier<S, A> for RuleClassifier {
    fn classify(&self, ctx: &ClassificationContext<'_, S, A>) -> FailureCategory {
        ctx.probe_reason
            .and_then(classify_reason)
            .or_else(|| self.classify_metrics(&ctx.metrics))
            .unwrap_or(FailureCategory::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(classifier: &RuleClassifier, reason: Option<&str>, metrics: FailureMetrics) -> FailureCategory {
        let ctx: ClassificationContext<'_, (), ()> = ClassificationContext::for_probe(&(), reason, metrics);
        classifier.classify(&ctx)
    }

    #[test]
    fn test_classify_reason_keywords() {
        assert_eq!(classify_reason("HTTP 429 Too Many Requests"), Some(FailureCategory::RateLimited));
        assert_eq!(classify_reason("auth token expired"), Some(FailureCategory::AuthDenied));
        assert_eq!(classify_reason("ripgrep: command not found"), Some(FailureCategory::ToolMissing));
        assert_eq!(classify_reason("goal infeasible"), Some(FailureCategory::Infeasible));
        assert_eq!(classify_reason("no-hits"), Some(FailureCategory::NoData));
        assert_eq!(classify_reason("result set empty"), Some(FailureCategory::NoData));
        assert_eq!(classify_reason("too-many-hits"), Some(FailureCategory::TooBroad));
        assert_eq!(classify_reason("entropy-high"), Some(FailureCategory::TooBroad));
        assert_eq!(classify_reason("too-few-hits"), Some(FailureCategory::TooNarrow));
        assert_eq!(classify_reason("entropy-low"), Some(FailureCategory::TooNarrow));
    }

    #[test]
    fn test_classify_reason_whole_words_only() {
        assert_eq!(classify_reason("author field missing from result"), None);
        assert_eq!(classify_reason("authoring step skipped"), None);
        assert_eq!(classify_reason("payload of 4290 bytes"), None);
        assert_eq!(classify_reason("checksum 14031 mismatch"), None);
        assert_eq!(classify_reason("auth-failed"), Some(FailureCategory::AuthDenied));
        assert_eq!(classify_reason("Authentication required"), Some(FailureCategory::AuthDenied));
        assert_eq!(classify_reason("status 403"), Some(FailureCategory::AuthDenied));
        assert_eq!(classify_reason("client was rate limited"), Some(FailureCategory::RateLimited));
        assert_eq!(classify_reason("emptyish"), None);
    }

    #[test]
    fn test_classify_reason_unknown() {
        assert_eq!(classify_reason("something odd happened"), None);
        assert_eq!(classify_reason(""), None);
    }

    #[test]
    fn test_reason_wins_over_metrics() {
        let classifier = RuleClassifier::new().with_hit_bounds(1.0, 10.0);
        let metrics = FailureMetrics {
            hits: Some(500.0),
            ..Default::default()
        };
        assert_eq!(classify(&classifier, Some("no-hits"), metrics), FailureCategory::NoData);
    }

    #[test]
    fn test_entropy_thresholds() {
        let classifier = RuleClassifier::new().with_entropy_bounds(0.5, 2.0);
        let high = FailureMetrics {
            entropy: Some(3.0),
            ..Default::default()
        };
        let low = FailureMetrics {
            entropy: Some(0.1),
            ..Default::default()
        };
        assert_eq!(classify(&classifier, Some("opaque"), high), FailureCategory::TooBroad);
        assert_eq!(classify(&classifier, None, low), FailureCategory::TooNarrow);
    }

    #[test]
    fn test_hit_thresholds() {
        let classifier = RuleClassifier::new().with_hit_bounds(2.0, 10.0);
        let many = FailureMetrics {
            hits: Some(11.0),
            ..Default::default()
        };
        let few = FailureMetrics {
            hits: Some(1.0),
            ..Default::default()
        };
        assert_eq!(classify(&classifier, None, many), FailureCategory::TooBroad);
        assert_eq!(classify(&classifier, None, few), FailureCategory::TooNarrow);
    }

    #[test]
    fn test_unset_thresholds_default_to_unknown() {
        let classifier = RuleClassifier::new();
        let metrics = FailureMetrics {
            hits: Some(1_000_000.0),
            entropy: Some(99.0),
            last_feedback: Some(-1.0),
        };
        assert_eq!(classify(&classifier, Some("weird"), metrics), FailureCategory::Unknown);
    }

    #[test]
    fn test_metrics_from_probe_data() {
        let data = json!({"hits": 3.0, "entropy": 0.7, "other": "x"});
        let metrics = FailureMetrics::from_probe_data(Some(&data)).with_last_feedback(Some(0.2));
        assert_eq!(metrics.hits, Some(3.0));
        assert_eq!(metrics.entropy, Some(0.7));
        assert_eq!(metrics.last_feedback, Some(0.2));
        assert_eq!(FailureMetrics::from_probe_data(None), FailureMetrics::default());
    }

    #[test]
    fn test_rule_classifier_deserializes_partial() {
        let classifier: RuleClassifier = serde_yaml::from_str("hits_high: 50.0").unwrap();
        assert_eq!(classifier.hits_high, Some(50.0));
        assert!(classifier.entropy_low.is_none());
    }
}
