//! Run a remote call until it succeeds, fails permanently, or the policy says stop.

use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::backoff::BackoffPolicy;
use super::classify::should_retry;
use crate::error::{CallError, CoreError, Result};
use crate::sleep::{Sleeper, TokioSleeper};

/// Applies the classifier and a [`BackoffPolicy`] around a fallible call.
///
/// Holds no per-invocation state; one executor can drive any number of
/// concurrent calls.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}

impl RetryExecutor {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Invoke `operation` until it succeeds or retrying must stop.
    ///
    /// Both the call and the backoff wait race `cancel`; a fired token wins
    /// and yields [`CoreError::Cancelled`].
    pub async fn execute<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, CallError>>,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled { attempts });
            }
            attempts += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CoreError::Cancelled { attempts }),
                outcome = operation() => outcome,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, "call succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !should_retry(Some(&err), attempts) {
                debug!(attempts, error = %err, "call failed permanently");
                return Err(CoreError::Rejected(err));
            }

            let delay = self.policy.next_delay(attempts - 1);
            let elapsed = start.elapsed();
            if self.policy.exhausted(attempts, elapsed, delay) {
                warn!(attempts, ?elapsed, error = %err, "giving up on call");
                return Err(CoreError::RetriesExhausted {
                    attempts,
                    elapsed,
                    source: err,
                });
            }

            warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying call"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CoreError::Cancelled { attempts }),
                _ = self.sleeper.sleep(delay) => {}
            }
        }
    }
}
