//! Bounded polling with fixed spacing.
//!
//! A small combinator instead of retry logic baked into each use case. The
//! operation reports per attempt whether the thing it is waiting for exists
//! yet; real errors short-circuit immediately and are never retried here.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Per-attempt verdict from the polled operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Ready(T),
    NotYet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt came back `NotYet`.
    #[error("not ready after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// The operation itself failed; no further attempts were made.
    #[error("operation failed: {0}")]
    Failed(E),
}

/// Run `op` up to `policy.max_attempts` times, sleeping `policy.delay`
/// between attempts. The sleep is skipped after the final attempt.
///
/// `op` receives the 1-based attempt number, mostly for logging.
pub async fn poll_until_ready<T, E, F, Fut>(
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
{
    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Ok(Attempt::Ready(value)) => return Ok(value),
            Ok(Attempt::NotYet) => {
                tracing::debug!(attempt, max_attempts = policy.max_attempts, "not ready yet");
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
            Err(err) => return Err(RetryError::Failed(err)),
        }
    }

    Err(RetryError::Exhausted {
        attempts: policy.max_attempts,
    })
}
