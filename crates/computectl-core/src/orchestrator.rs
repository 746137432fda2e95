//! Submit a mutation and wait for its operation
//!
//! [`Orchestrator::mutate`] is the only way mutating calls leave this crate:
//! the submission is retried on transient failures, the returned handle is
//! polled to a terminal state, and the caller gets either the finished
//! operation or a specific error. Nothing is left pending.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::OperationsApi;
use crate::error::{CallError, Result};
use crate::operation::{OperationReference, OperationStatus};
use crate::poller::OperationPoller;
use crate::progress::ProgressCallback;
use crate::retry::{BackoffPolicy, RetryExecutor};
use crate::sleep::{Sleeper, TokioSleeper};

/// Submission retry plus operation polling
#[derive(Debug, Clone)]
pub struct Orchestrator {
    executor: RetryExecutor,
    poller: OperationPoller,
}

impl Orchestrator {
    /// Orchestrator with default retry and poll policies
    pub fn new(api: Arc<dyn OperationsApi>) -> Self {
        Self::builder(api).build()
    }

    pub fn builder(api: Arc<dyn OperationsApi>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(api)
    }

    pub fn poller(&self) -> &OperationPoller {
        &self.poller
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    /// Submit through the retry executor, then poll the returned operation
    ///
    /// A submission that fails permanently or exhausts its retries is
    /// returned without any status fetch.
    pub async fn mutate<F, Fut>(
        &self,
        cancel: &CancellationToken,
        submit: F,
    ) -> Result<OperationStatus>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<OperationReference, CallError>>,
    {
        let operation = self.executor.execute(cancel, submit).await?;
        debug!(operation = %operation, "submission accepted");
        self.poller.wait(operation, cancel).await
    }

    /// Poll an operation that was submitted elsewhere
    pub async fn wait(
        &self,
        operation: OperationReference,
        cancel: &CancellationToken,
    ) -> Result<OperationStatus> {
        self.poller.wait(operation, cancel).await
    }

    /// Run a non-mutating call with the submission retry policy
    pub async fn call<F, Fut, T>(&self, cancel: &CancellationToken, call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, CallError>>,
    {
        self.executor.execute(cancel, call).await
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    api: Arc<dyn OperationsApi>,
    retry: BackoffPolicy,
    poll: BackoffPolicy,
    deadline: Option<Duration>,
    sleeper: Arc<dyn Sleeper>,
    on_progress: Option<ProgressCallback>,
}

impl OrchestratorBuilder {
    fn new(api: Arc<dyn OperationsApi>) -> Self {
        Self {
            api,
            retry: BackoffPolicy::default(),
            poll: BackoffPolicy::polling(),
            deadline: None,
            sleeper: Arc::new(TokioSleeper),
            on_progress: None,
        }
    }

    /// Policy for submissions and for each status fetch
    pub fn retry_policy(mut self, policy: BackoffPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Cadence between status fetches
    pub fn poll_policy(mut self, policy: BackoffPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn poll_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn build(self) -> Orchestrator {
        let executor = RetryExecutor::new(self.retry).with_sleeper(self.sleeper.clone());
        let poller = OperationPoller::new(self.api, executor.clone(), self.poll)
            .with_sleeper(self.sleeper)
            .with_deadline(self.deadline)
            .with_progress(self.on_progress);
        Orchestrator { executor, poller }
    }
}
