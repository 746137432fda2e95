//! Progress events for operation polling
//!
//! The poller reports each step of an operation's life through an optional
//! callback. The CLI uses it to drive a spinner; library callers usually
//! leave it unset.

use std::sync::Arc;
use std::time::Duration;

use crate::operation::OperationState;

/// Progress events emitted while waiting for an operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has started for this operation
    Started { operation: String },
    /// One status fetch returned a non-terminal state
    Polling {
        operation: String,
        status: OperationState,
        progress: Option<u8>,
        elapsed: Duration,
    },
    /// Operation reached DONE without errors
    Completed {
        operation: String,
        target: Option<String>,
    },
    /// Operation failed, timed out, or polling gave up
    Failed { operation: String, error: String },
}

/// Callback type for progress updates
///
/// Shared rather than boxed so a poller can be cloned across calls.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
