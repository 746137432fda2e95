//! Operation polling
//!
//! Drives an [`OperationReference`] from submission to a terminal state:
//!
//! ```text
//! Submitted -> {PENDING, RUNNING}* -> DONE(ok) | DONE(error)
//! ```
//!
//! Every status fetch goes through the poller's own [`RetryExecutor`], so a
//! transient failure while polling is retried without disturbing the poll
//! cadence. A non-terminal status is not an error; the poller waits on its
//! own [`BackoffPolicy`] and asks again.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::OperationsApi;
use crate::error::{CoreError, Result};
use crate::operation::{OperationReference, OperationStatus};
use crate::progress::{ProgressCallback, ProgressEvent, emit};
use crate::retry::{BackoffPolicy, RetryExecutor};
use crate::sleep::{Sleeper, TokioSleeper};

/// Polls operation status until DONE, a deadline, or cancellation
#[derive(Clone)]
pub struct OperationPoller {
    api: Arc<dyn OperationsApi>,
    executor: RetryExecutor,
    poll_backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    deadline: Option<Duration>,
    on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for OperationPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationPoller")
            .field("executor", &self.executor)
            .field("poll_backoff", &self.poll_backoff)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl OperationPoller {
    pub fn new(
        api: Arc<dyn OperationsApi>,
        executor: RetryExecutor,
        poll_backoff: BackoffPolicy,
    ) -> Self {
        Self {
            api,
            executor,
            poll_backoff,
            sleeper: Arc::new(TokioSleeper),
            deadline: None,
            on_progress: None,
        }
    }

    /// Sleeper for the waits between polls
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Give up with [`CoreError::PollTimedOut`] once this much time has passed
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_progress(mut self, on_progress: Option<ProgressCallback>) -> Self {
        self.on_progress = on_progress;
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Poll `operation` until it reaches a terminal state
    ///
    /// Returns the final status when the operation finished cleanly,
    /// [`CoreError::OperationFailed`] when it finished with errors, and
    /// [`CoreError::PollTimedOut`] or [`CoreError::Cancelled`] when the wait
    /// was cut short. Fetch failures are returned as the executor reports them.
    pub async fn wait(
        &self,
        operation: OperationReference,
        cancel: &CancellationToken,
    ) -> Result<OperationStatus> {
        let start = Instant::now();
        let mut tick: u32 = 0;

        debug!(operation = %operation, "waiting for operation");
        emit(
            &self.on_progress,
            ProgressEvent::Started {
                operation: operation.name.clone(),
            },
        );

        let deadline_at = self.deadline.map(|deadline| start + deadline);

        loop {
            let api = &self.api;
            let op = &operation;
            let fetch = self.executor.execute(cancel, move || api.operation_status(op));

            // The deadline also bounds a slow fetch and the retries inside it
            let outcome = match deadline_at {
                Some(at) => tokio::select! {
                    biased;
                    outcome = fetch => outcome,
                    _ = tokio::time::sleep_until(at) => Err(self.timed_out(&operation)),
                },
                None => fetch.await,
            };
            let status = match outcome {
                Ok(status) => status,
                Err(err) => return Err(self.fail(&operation, err)),
            };

            if status.is_done() {
                return self.finish(operation, status, start.elapsed());
            }

            let elapsed = start.elapsed();
            emit(
                &self.on_progress,
                ProgressEvent::Polling {
                    operation: operation.name.clone(),
                    status: status.status,
                    progress: status.progress,
                    elapsed,
                },
            );

            let mut delay = self.poll_backoff.next_delay(tick);
            if let Some(deadline) = self.deadline {
                if elapsed >= deadline {
                    return Err(self.fail(&operation, self.timed_out(&operation)));
                }
                delay = delay.min(deadline - elapsed);
            }

            debug!(
                operation = %operation.name,
                status = %status.status,
                tick,
                delay_ms = delay.as_millis() as u64,
                "operation not done yet"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let err = CoreError::Cancelled { attempts: tick + 1 };
                    return Err(self.fail(&operation, err));
                }
                _ = self.sleeper.sleep(delay) => {}
            }
            tick = tick.saturating_add(1);
        }
    }

    fn finish(
        &self,
        operation: OperationReference,
        status: OperationStatus,
        elapsed: Duration,
    ) -> Result<OperationStatus> {
        if status.has_failed() {
            let err = CoreError::OperationFailed {
                operation: operation.name.clone(),
                errors: status.errors().to_vec(),
            };
            return Err(self.fail(&operation, err));
        }

        info!(operation = %operation.name, ?elapsed, "operation completed");
        emit(
            &self.on_progress,
            ProgressEvent::Completed {
                operation: operation.name,
                target: status.target_name().map(str::to_string),
            },
        );
        Ok(status)
    }

    fn timed_out(&self, operation: &OperationReference) -> CoreError {
        CoreError::PollTimedOut {
            operation: operation.name.clone(),
            deadline: self.deadline.unwrap_or_default(),
        }
    }

    fn fail(&self, operation: &OperationReference, err: CoreError) -> CoreError {
        emit(
            &self.on_progress,
            ProgressEvent::Failed {
                operation: operation.name.clone(),
                error: err.to_string(),
            },
        );
        err
    }
}
