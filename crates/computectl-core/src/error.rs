//! Unified error handling for computectl-core
//!
//! Two layers of errors live here:
//!
//! - [`CallError`] is the raw failure of a single remote call (submission or
//!   status fetch). The retry engine classifies these.
//! - [`CoreError`] is the terminal result of an orchestrated call. Every
//!   non-success path carries a distinct [`ErrorKind`] tag.
//!
//! # Example
//!
//! ```rust
//! use computectl_core::{CallError, CoreError, ErrorKind};
//!
//! let err = CoreError::Rejected(CallError::api(404, "disk not found"));
//! assert!(err.is_not_found());
//! assert!(!err.is_retryable());
//! assert_eq!(err.kind(), ErrorKind::ClientRejected);
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::operation::OperationErrorDetail;
use crate::retry::{ErrorClass, classify};

/// Failure of a single remote call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The API answered with a non-success HTTP status
    #[error("HTTP {code}: {message}")]
    Api { code: u16, message: String },

    /// The request never produced an HTTP response (connection reset, EOF, timeout...)
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built locally
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CallError {
    /// Structured API error with a status code
    pub fn api(code: u16, message: impl Into<String>) -> Self {
        CallError::Api {
            code,
            message: message.into(),
        }
    }

    /// Unstructured transport failure
    pub fn transport(message: impl Into<String>) -> Self {
        CallError::Transport(message.into())
    }

    /// HTTP status code, if the API produced one
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CallError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return CallError::api(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return CallError::Decode(err.to_string());
        }
        if err.is_builder() {
            return CallError::InvalidRequest(err.to_string());
        }
        // reqwest reports timeouts as "operation timed out" deep in the source
        // chain; keep the marker visible to the classifier.
        if err.is_timeout() {
            return CallError::Transport(format!("timeout: {}", error_chain(&err)));
        }
        CallError::Transport(error_chain(&err))
    }
}

/// Flatten an error and its sources into one message
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Taxonomy tag of a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-retryable rejection of the request (4xx-style or unknown failure)
    ClientRejected,
    /// Retryable failures persisted past the retry ceiling
    RetriesExhausted,
    /// The remote operation completed but reported errors
    OperationFailed,
    /// The operation did not reach a terminal state before the poll deadline
    PollTimedOut,
    /// The caller cancelled the sequence
    Cancelled,
    /// The request was invalid before anything was sent
    InvalidRequest,
    /// The API answered with something unusable
    InvalidResponse,
}

/// Terminal error of an orchestrated call
#[derive(Error, Debug)]
pub enum CoreError {
    /// A call failed with an error that must not be retried
    #[error("request rejected: {0}")]
    Rejected(CallError),

    /// Retryable failures continued until the retry ceiling was reached
    #[error("retries exhausted after {attempts} attempts over {elapsed:?}: {source}")]
    RetriesExhausted {
        attempts: u32,
        elapsed: Duration,
        #[source]
        source: CallError,
    },

    /// The operation reached DONE with an error payload
    #[error("operation {operation} failed: {}", format_details(.errors))]
    OperationFailed {
        operation: String,
        errors: Vec<OperationErrorDetail>,
    },

    /// The operation was still running when the poll deadline passed
    #[error("operation {operation} did not complete within {deadline:?}")]
    PollTimedOut { operation: String, deadline: Duration },

    /// The cancellation token fired
    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// Rejected locally, nothing was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered successfully but the body was unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

fn format_details(errors: &[OperationErrorDetail]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Taxonomy tag for this failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Rejected(CallError::InvalidRequest(_)) => ErrorKind::InvalidRequest,
            CoreError::Rejected(CallError::Decode(_)) => ErrorKind::InvalidResponse,
            CoreError::Rejected(_) => ErrorKind::ClientRejected,
            CoreError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            CoreError::OperationFailed { .. } => ErrorKind::OperationFailed,
            CoreError::PollTimedOut { .. } => ErrorKind::PollTimedOut,
            CoreError::Cancelled { .. } => ErrorKind::Cancelled,
            CoreError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            CoreError::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }

    /// Class of the last remote failure, for errors that wrap one
    #[must_use]
    pub fn last_error_class(&self) -> Option<ErrorClass> {
        match self {
            CoreError::Rejected(e) => Some(classify(Some(e))),
            CoreError::RetriesExhausted { source, .. } => Some(classify(Some(source))),
            _ => None,
        }
    }

    /// Underlying call error, if any
    #[must_use]
    pub fn call_error(&self) -> Option<&CallError> {
        match self {
            CoreError::Rejected(e) => Some(e),
            CoreError::RetriesExhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.call_error().and_then(CallError::status_code) == Some(404)
    }

    /// Returns true if this is a rate limiting error (429)
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.last_error_class() == Some(ErrorClass::RateLimited)
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.call_error()
            .and_then(CallError::status_code)
            .is_some_and(|code| (500..600).contains(&code))
    }

    /// Returns true if the operation outlived the poll deadline
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::PollTimedOut { .. })
    }

    /// Returns true if the caller cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled { .. })
    }

    /// Returns true if repeating the whole call later might succeed
    ///
    /// Exhausted retries and poll timeouts say nothing about the request
    /// itself; rejections and failed operations do.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::RetriesExhausted { .. } | CoreError::PollTimedOut { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_not_found() {
        let err = CoreError::Rejected(CallError::api(404, "The resource was not found"));

        assert!(err.is_not_found());
        assert!(!err.is_rate_limited());
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::ClientRejected);
    }

    #[test]
    fn test_exhausted_keeps_last_class() {
        let err = CoreError::RetriesExhausted {
            attempts: 10,
            elapsed: Duration::from_secs(30),
            source: CallError::api(429, "Rate Limit Exceeded"),
        };

        assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
        assert_eq!(err.last_error_class(), Some(ErrorClass::RateLimited));
    }

    #[test]
    fn test_server_error_helper() {
        let err = CoreError::RetriesExhausted {
            attempts: 3,
            elapsed: Duration::from_secs(1),
            source: CallError::api(503, "backend unavailable"),
        };
        assert!(err.is_server_error());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_local_failures_map_to_their_own_kinds() {
        let err = CoreError::Rejected(CallError::Decode("expected value".to_string()));
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let err = CoreError::InvalidRequest("disks are not regional".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(err.call_error().is_none());
    }

    #[test]
    fn test_operation_failed_display() {
        let err = CoreError::OperationFailed {
            operation: "operation-123".to_string(),
            errors: vec![OperationErrorDetail {
                code: "QUOTA_EXCEEDED".to_string(),
                location: None,
                message: "Quota 'CPUS' exceeded".to_string(),
            }],
        };

        let display = err.to_string();
        assert!(display.contains("operation-123"));
        assert!(display.contains("QUOTA_EXCEEDED"));
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_and_cancel_are_distinct() {
        let timeout = CoreError::PollTimedOut {
            operation: "op".to_string(),
            deadline: Duration::from_secs(60),
        };
        let cancelled = CoreError::Cancelled { attempts: 2 };

        assert!(timeout.is_timeout());
        assert!(!timeout.is_cancelled());
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_timeout());
        assert_ne!(timeout.kind(), cancelled.kind());
    }
}
