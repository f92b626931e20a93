//! Exploration-intensity ladder.
//!
//! A bounded scalar raised by positive feedback and lowered by negative
//! feedback. Policies read it to decide how exploratory the next action is.

use serde::{Deserialize, Serialize};

/// Read/update access to an exploration level.
pub trait Ladder: Send + Sync {
    /// Feed one feedback value into the controller.
    fn update(&mut self, feedback: f64);

    /// Current level. Pure read.
    fn level(&self) -> f64;
}

/// Gains and ceiling for [`ExplorationLadder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    /// Scale applied to non-negative feedback
    pub gain_up: f64,
    /// Scale applied to negative feedback
    pub gain_down: f64,
    /// Ceiling of the level
    pub max: f64,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            gain_up: 0.5,
            gain_down: 0.5,
            max: 3.0,
        }
    }
}

/// Level in `[0, max]`, starting at 0.
#[derive(Debug, Clone)]
pub struct ExplorationLadder {
    config: LadderConfig,
    level: f64,
}

impl ExplorationLadder {
    pub fn new() -> Self {
        Self::with_config(LadderConfig::default())
    }

    pub fn with_config(config: LadderConfig) -> Self {
        Self { config, level: 0.0 }
    }

    /// Start from a specific level (clamped into range).
    pub fn starting_at(mut self, level: f64) -> Self {
        self.level = level.clamp(0.0, self.config.max.max(0.0));
        self
    }

    pub fn config(&self) -> &LadderConfig {
        &self.config
    }
}

impl Default for ExplorationLadder {
    fn default() -> Self {
        Self::new()
    }
}

impl Ladder for ExplorationLadder {
    fn update(&mut self, feedback: f64) {
        if feedback >= 0.0 {
            self.level = (self.level + self.config.gain_up * feedback).min(self.config.max);
        } else {
            self.level = (self.level + self.config.gain_down * feedback).max(0.0);
        }
    }

    fn level(&self) -> f64 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LadderConfig::default();
        assert_eq!(config.gain_up, 0.5);
        assert_eq!(config.gain_down, 0.5);
        assert_eq!(config.max, 3.0);
    }

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(ExplorationLadder::new().level(), 0.0);
    }

    #[test]
    fn test_positive_feedback_raises_by_gain() {
        let mut ladder = ExplorationLadder::new();
        ladder.update(1.0);
        assert_eq!(ladder.level(), 0.5);
    }

    #[test]
    fn test_non_negative_feedback_is_monotone_and_capped() {
        let mut ladder = ExplorationLadder::new();
        let mut previous = ladder.level();
        for feedback in [0.0, 0.3, 2.0, 5.0, 0.0, 10.0, 1.0] {
            ladder.update(feedback);
            assert!(ladder.level() >= previous);
            assert!(ladder.level() <= 3.0);
            previous = ladder.level();
        }
        assert_eq!(ladder.level(), 3.0);
    }

    #[test]
    fn test_negative_feedback_never_below_zero() {
        let mut ladder = ExplorationLadder::new().starting_at(1.0);
        for feedback in [-0.5, -3.0, -10.0, -0.1] {
            ladder.update(feedback);
            assert!(ladder.level() >= 0.0);
        }
        assert_eq!(ladder.level(), 0.0);
    }

    #[test]
    fn test_negative_feedback_lowers_by_gain() {
        let mut ladder = ExplorationLadder::with_config(LadderConfig {
            gain_up: 1.0,
            gain_down: 0.25,
            max: 5.0,
        })
        .starting_at(2.0);
        ladder.update(-2.0);
        assert_eq!(ladder.level(), 1.5);
    }

    #[test]
    fn test_starting_at_clamps() {
        assert_eq!(ExplorationLadder::new().starting_at(10.0).level(), 3.0);
        assert_eq!(ExplorationLadder::new().starting_at(-1.0).level(), 0.0);
    }
}
