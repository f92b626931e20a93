//! Domain types for probeloop
//!
//! This module contains the core value types shared by every layer:
//! - Cost: scalar or per-dimension charges against a budget
//! - FailureCategory: the closed failure taxonomy
//! - StopReason: why a run stopped
//! - StepLog: the append-only per-step audit record
//! - EngineEvent: observability events

pub mod cost;
pub mod event;
pub mod failure;
pub mod outcome;
pub mod step_log;

pub use cost::Cost;
pub use event::{EngineEvent, event_types};
pub use failure::FailureCategory;
pub use outcome::StopReason;
pub use step_log::{StepFailure, StepLog};
