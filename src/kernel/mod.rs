//! Control kernel module - the reusable single-step primitive.
//!
//! This module provides:
//! - ControlKernel for running one observe/decide/apply/evaluate step
//! - RetryConfig and the immediate-retry helpers used by every phase

mod control;
mod retry;

pub use control::{ControlKernel, KernelStep};
pub use retry::{RetryConfig, with_retry};
