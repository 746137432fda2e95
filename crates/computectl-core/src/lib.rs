//! # computectl-core
//!
//! Operation lifecycle and retry engine for an operation-based compute API.
//!
//! Mutating calls against the API return immediately with a handle to a
//! long-running operation. This crate turns that into a call that returns
//! only when the operation is finished:
//!
//! 1. [`RetryExecutor`] re-invokes a call on transient failures (429, 5xx,
//!    connection resets) with exponential backoff.
//! 2. [`OperationPoller`] fetches the operation status from the zonal,
//!    regional or global endpoint until it reports `DONE`.
//! 3. [`Orchestrator`] chains the two for every mutation.
//!
//! [`ComputeClient`] is the REST transport and [`Compute`] the per-resource
//! surface on top of it. Both are generic over the API surface ([`V1`],
//! [`Beta`], [`Alpha`]).
//!
//! ## Crate Structure
//!
//! ```text
//! computectl-core/
//! ├── src/
//! │   ├── lib.rs
//! │   ├── error.rs        # CallError, CoreError, ErrorKind
//! │   ├── retry/          # classifier, backoff policy, executor
//! │   ├── sleep.rs        # injectable sleeper
//! │   ├── operation.rs    # handles and status snapshots
//! │   ├── api.rs          # status-fetch trait
//! │   ├── poller.rs       # operation polling
//! │   ├── orchestrator.rs # submit + poll
//! │   ├── progress.rs     # progress events
//! │   ├── version.rs      # API surface markers
//! │   ├── client.rs       # REST transport
//! │   ├── resources.rs    # resource adapters
//! │   └── config/         # profiles and resilience settings
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod orchestrator;
pub mod poller;
pub mod progress;
pub mod resources;
pub mod retry;
pub mod sleep;
pub mod version;

pub use api::OperationsApi;
pub use client::{
    ComputeClient, ComputeClientBuilder, DEFAULT_ENDPOINT, DEFAULT_WAIT_TIMEOUT, StatusMethod,
};
pub use config::{Config, ConfigError, Profile, ResilienceConfig};
pub use error::{CallError, CoreError, ErrorKind, Result};
pub use operation::{
    OperationErrorDetail, OperationReference, OperationState, OperationStatus, Scope,
};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use poller::OperationPoller;
pub use progress::{ProgressCallback, ProgressEvent};
pub use resources::{Compute, ResourceKind, ScopeKind};
pub use retry::{
    BackoffPolicy, ErrorClass, JitterSource, NoJitter, RandomJitter, RetryExecutor, classify,
    should_retry,
};
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
pub use tokio_util::sync::CancellationToken;
pub use version::{Alpha, ApiVersion, ApiVersionKind, Beta, V1};
