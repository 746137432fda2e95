//! Classify call failures into retry classes.

use crate::error::CallError;

/// Markers of transport failures that usually succeed on a second try.
const TRANSIENT_MARKERS: &[&str] = &["connection reset", "unexpected eof", "timeout", "timed out"];

/// High-level class of a call outcome for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network-level failure (connection reset, EOF, timeout).
    TransientNetwork,
    /// The API asked us to slow down (429).
    RateLimited,
    /// Temporary server fault (500, 502, 503, 504).
    ServerError,
    /// Anything else; retrying will not help.
    ClientRejected,
    /// No error at all.
    Success,
}

impl ErrorClass {
    /// Whether a call in this class is worth repeating.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorClass::TransientNetwork | ErrorClass::RateLimited | ErrorClass::ServerError
        )
    }
}

/// Classify the outcome of one call.
pub fn classify(error: Option<&CallError>) -> ErrorClass {
    match error {
        None => ErrorClass::Success,
        Some(CallError::Api { code, .. }) => classify_status(*code),
        Some(CallError::Transport(message)) => classify_transport(message),
        Some(CallError::Decode(_) | CallError::InvalidRequest(_)) => ErrorClass::ClientRejected,
    }
}

/// Whether the call should be attempted again.
///
/// `attempts_so_far` is accepted for call-site symmetry with the executor;
/// the attempt ceiling itself belongs to [`BackoffPolicy`](super::BackoffPolicy).
pub fn should_retry(error: Option<&CallError>, _attempts_so_far: u32) -> bool {
    classify(error).is_retryable()
}

fn classify_status(code: u16) -> ErrorClass {
    match code {
        429 => ErrorClass::RateLimited,
        500 | 502 | 503 | 504 => ErrorClass::ServerError,
        _ => ErrorClass::ClientRejected,
    }
}

fn classify_transport(message: &str) -> ErrorClass {
    let message = message.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
        ErrorClass::TransientNetwork
    } else {
        ErrorClass::ClientRejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_error_is_success() {
        assert_eq!(classify(None), ErrorClass::Success);
        assert!(!should_retry(None, 0));
    }

    #[test]
    fn throttling_and_server_faults_retry() {
        for code in [429, 500, 502, 503, 504] {
            assert!(
                should_retry(Some(&CallError::api(code, "transient")), 1),
                "{code} should retry"
            );
        }
        assert_eq!(
            classify(Some(&CallError::api(429, "Rate Limit Exceeded"))),
            ErrorClass::RateLimited
        );
        assert_eq!(
            classify(Some(&CallError::api(502, "Bad Gateway"))),
            ErrorClass::ServerError
        );
    }

    #[test]
    fn client_errors_do_not_retry() {
        for code in [400, 403, 404, 409, 412] {
            let err = CallError::api(code, "rejected");
            assert_eq!(classify(Some(&err)), ErrorClass::ClientRejected);
            assert!(!should_retry(Some(&err), 0));
        }
    }

    #[test]
    fn transport_markers_retry() {
        let reset = CallError::transport("read tcp 10.0.0.1:443: connection reset by peer");
        let eof = CallError::transport("unexpected EOF");
        let timeout = CallError::transport("timeout: operation timed out");

        assert_eq!(classify(Some(&reset)), ErrorClass::TransientNetwork);
        assert!(should_retry(Some(&eof), 0));
        assert!(should_retry(Some(&timeout), 3));
    }

    #[test]
    fn unrelated_transport_errors_do_not_retry() {
        assert!(!should_retry(Some(&CallError::transport("foo")), 0));
        assert!(!should_retry(
            Some(&CallError::transport("invalid peer certificate")),
            0
        ));
    }

    #[test]
    fn local_failures_never_retry() {
        assert!(!should_retry(Some(&CallError::Decode("eof".into())), 0));
        assert!(!should_retry(
            Some(&CallError::InvalidRequest("bad url".into())),
            0
        ));
    }

    #[test]
    fn verdict_ignores_attempt_count() {
        let err = CallError::api(503, "unavailable");
        assert_eq!(should_retry(Some(&err), 0), should_retry(Some(&err), 99));
    }
}
