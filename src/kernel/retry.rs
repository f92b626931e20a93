//! Immediate-retry helpers.
//!
//! A phase is re-invoked right away when it fails, up to `n` additional
//! times. There is no backoff or jitter; callers wanting a delay add it
//! themselves. After `n + 1` failures the last underlying error is returned
//! unchanged.

use std::future::Future;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Additional attempts per phase (0 = no retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub observe: u32,
    pub decide: u32,
    pub apply: u32,
    pub evaluate: u32,
    /// Planner calls in the hierarchical form
    pub plan: u32,
}

impl RetryConfig {
    /// Same retry count for every phase.
    pub fn uniform(retries: u32) -> Self {
        Self {
            observe: retries,
            decide: retries,
            apply: retries,
            evaluate: retries,
            plan: retries,
        }
    }
}

/// Retry an awaited phase expression in place.
///
/// The expression is re-evaluated on every attempt, so it may borrow
/// mutably (e.g. `env.apply(&action)`).
#[macro_export]
macro_rules! retry_phase {
    ($phase:expr, $retries:expr, $op:expr) => {{
        let retries: u32 = $retries;
        let mut attempt: u32 = 0;
        loop {
            match $op.await {
                Ok(value) => break Ok(value),
                Err(err) if attempt < retries => {
                    attempt += 1;
                    ::log::warn!("{} failed (attempt {}/{}): {}", $phase, attempt, retries + 1, err);
                }
                Err(err) => break Err(err),
            }
        }
    }};
}

/// Closure form of [`retry_phase!`] for operations over shared references.
pub async fn with_retry<T, F, Fut>(phase: &str, retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries => {
                attempt += 1;
                warn!("{} failed (attempt {}/{}): {}", phase, attempt, retries + 1, err);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeloopError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        calls: AtomicU32,
        succeed_on: u32,
    }

    impl Flaky {
        fn new(succeed_on: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on,
            }
        }

        async fn call(&self) -> Result<u32> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.succeed_on {
                Ok(n)
            } else {
                Err(ProbeloopError::Environment(format!("failure {}", n)))
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_no_retry_on_success() {
        let flaky = Flaky::new(1);
        let value = with_retry("observe", 3, || flaky.call()).await.unwrap();
        assert_eq!(value, 1);
        assert_eq!(flaky.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let flaky = Flaky::new(3);
        let value = with_retry("observe", 2, || flaky.call()).await.unwrap();
        assert_eq!(value, 3);
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn test_reraises_after_n_plus_one_failures() {
        let flaky = Flaky::new(100);
        let err = with_retry("apply", 2, || flaky.call()).await.unwrap_err();
        assert_eq!(flaky.calls(), 3);
        assert_eq!(err.to_string(), "Environment error: failure 3");
    }

    #[tokio::test]
    async fn test_zero_retries_fails_once() {
        let flaky = Flaky::new(2);
        assert!(with_retry("decide", 0, || flaky.call()).await.is_err());
        assert_eq!(flaky.calls(), 1);
    }

    #[tokio::test]
    async fn test_macro_matches_closure_form() {
        let flaky = Flaky::new(2);
        let value: Result<u32> = retry_phase!("evaluate", 1, flaky.call());
        assert_eq!(value.unwrap(), 2);

        let failing = Flaky::new(100);
        let value: Result<u32> = retry_phase!("evaluate", 1, failing.call());
        assert!(value.is_err());
        assert_eq!(failing.calls(), 2);
    }

    #[test]
    fn test_uniform() {
        let config = RetryConfig::uniform(2);
        assert_eq!(config.observe, 2);
        assert_eq!(config.plan, 2);
        assert_eq!(RetryConfig::default().apply, 0);
    }
}
