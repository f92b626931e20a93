//! Engine configuration loaded from YAML.
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes. Sections convert into the runtime types the orchestrators take.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::budget::{ControlBudget, SimpleBudget};
use crate::error::{ProbeloopError, Result};
use crate::kernel::RetryConfig;
use crate::ladder::LadderConfig;
use crate::runner::OrchestratorConfig;
use crate::scheduler::{RuleClassifier, ThresholdTermination};

const PROJECT_NAME: &str = "probeloop";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default `env_logger` filter, used when `RUST_LOG` is unset
    pub log_level: Option<String>,
    pub ladder: LadderConfig,
    pub run: RunConfig,
    pub retry: RetryConfig,
    pub termination: ThresholdTermination,
    pub classifier: RuleClassifier,
    pub budget: BudgetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub max_steps: usize,
    pub max_inner_steps: usize,
    pub reselection_rounds: usize,
    pub max_replans: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_inner_steps: 20,
            reselection_rounds: 1,
            max_replans: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Flat-form cap
    pub cap: f64,
    /// Hierarchical inner-loop cap, restored on every accepted replan
    pub inner: f64,
    /// Hierarchical planner-call cap
    pub outer: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            cap: 100.0,
            inner: 20.0,
            outer: 5.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            ladder: LadderConfig::default(),
            run: RunConfig::default(),
            retry: RetryConfig::default(),
            termination: ThresholdTermination::default(),
            classifier: RuleClassifier::default(),
            budget: BudgetConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .map_err(|e| ProbeloopError::Config(format!("Failed to load config from {}: {}", path.display(), e)));
        }

        // ~/.config/probeloop/probeloop.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(PROJECT_NAME).join(format!("{}.yml", PROJECT_NAME));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // ./probeloop.yml
        let fallback_config = PathBuf::from(format!("{}.yml", PROJECT_NAME));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values no run could make sense of.
    pub fn validate(&self) -> Result<()> {
        if self.ladder.max < 0.0 {
            return Err(ProbeloopError::Config("ladder.max must be non-negative".into()));
        }
        if self.ladder.gain_up < 0.0 || self.ladder.gain_down < 0.0 {
            return Err(ProbeloopError::Config("ladder gains must be non-negative".into()));
        }
        for (name, cap) in [
            ("budget.cap", self.budget.cap),
            ("budget.inner", self.budget.inner),
            ("budget.outer", self.budget.outer),
        ] {
            if !cap.is_finite() || cap < 0.0 {
                return Err(ProbeloopError::Config(format!("{} must be a finite non-negative number", name)));
            }
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_steps: self.run.max_steps,
            max_inner_steps: self.run.max_inner_steps,
            reselection_rounds: self.run.reselection_rounds,
            max_replans: self.run.max_replans,
            retries: self.retry,
        }
    }

    /// Logger filter to apply. An explicit `RUST_LOG` value always wins.
    pub fn log_filter(&self, rust_log: Option<&str>) -> Option<String> {
        match rust_log {
            Some(filter) if !filter.trim().is_empty() => None,
            _ => self.log_level.clone(),
        }
    }

    pub fn flat_budget(&self) -> SimpleBudget {
        SimpleBudget::new(self.budget.cap)
    }

    pub fn control_budget(&self) -> ControlBudget {
        ControlBudget::new(SimpleBudget::new(self.budget.inner), SimpleBudget::new(self.budget.outer))
    }

    /// `None` when no threshold is configured.
    pub fn termination(&self) -> Option<ThresholdTermination> {
        if self.termination == ThresholdTermination::default() {
            None
        } else {
            Some(self.termination.clone())
        }
    }
}
