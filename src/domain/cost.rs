//! Cost accounting units.
//!
//! A cost is either a bare amount or a set of named dimensions
//! (e.g. `tokens`, `steps`). Every budget consumes costs through
//! [`Cost::total`] or [`Cost::dimensions`], never by inspecting the variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A charge against a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cost {
    /// A single undifferentiated amount
    Scalar(f64),
    /// Amounts per named dimension
    Dimensions(BTreeMap<String, f64>),
}

impl Cost {
    /// The zero cost.
    pub fn zero() -> Self {
        Cost::Scalar(0.0)
    }

    /// Build a cost with a single named dimension.
    pub fn dimension(name: impl Into<String>, amount: f64) -> Self {
        let mut dims = BTreeMap::new();
        dims.insert(name.into(), amount);
        Cost::Dimensions(dims)
    }

    /// Build a cost from `(name, amount)` pairs. Repeated names are summed.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut dims = BTreeMap::new();
        for (name, amount) in pairs {
            *dims.entry(name.into()).or_insert(0.0) += amount;
        }
        Cost::Dimensions(dims)
    }

    /// Normalize to a single amount (sum of all dimensions).
    pub fn total(&self) -> f64 {
        match self {
            Cost::Scalar(amount) => *amount,
            Cost::Dimensions(dims) => dims.values().sum(),
        }
    }

    /// True when the normalized amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.total() == 0.0
    }

    /// Named dimensions, or `None` for a scalar cost.
    pub fn dimensions(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            Cost::Scalar(_) => None,
            Cost::Dimensions(dims) => Some(dims),
        }
    }
}

impl Default for Cost {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<f64> for Cost {
    fn from(amount: f64) -> Self {
        Cost::Scalar(amount)
    }
}

impl std::fmt::Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cost::Scalar(amount) => write!(f, "{}", amount),
            Cost::Dimensions(dims) => {
                let parts: Vec<String> = dims.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}
