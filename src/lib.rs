//! Probeloop - a generic, probe-gated control-loop engine
//!
//! Drives pluggable environments toward better states under explicit cost
//! budgets. Cheap probes gate each step, failures are classified and routed
//! to a better-suited probe/policy pair, and an optional planner supervises
//! a fast inner loop with slower plan/evaluate/replan calls.

pub mod budget;
pub mod config;
pub mod demo;
pub mod domain;
pub mod environment;
pub mod error;
pub mod events;
pub mod kernel;
pub mod ladder;
pub mod policy;
pub mod probe;
pub mod runner;
pub mod scheduler;

pub use error::{ProbeloopError, Result};
