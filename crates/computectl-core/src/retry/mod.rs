//! Retry and backoff for remote calls.
//!
//! Error classification and backoff decisions live here so the poller and
//! the orchestrator share one policy for every submission and status fetch.

mod backoff;
mod classify;
mod executor;

pub use backoff::{BackoffPolicy, JitterSource, NoJitter, RandomJitter};
pub use classify::{ErrorClass, classify, should_retry};
pub use executor::RetryExecutor;
