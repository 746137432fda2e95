//! Resilience configuration for API clients
//!
//! Retry and polling settings that can be stored per profile. Everything has
//! a serde default so a profile may set only what it needs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{DEFAULT_WAIT_TIMEOUT, StatusMethod};
use crate::retry::{BackoffPolicy, RandomJitter};

/// Configuration for retry and polling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Retry of submissions and status fetches
    #[serde(default)]
    pub retry: RetryConfig,

    /// Cadence and deadline of operation polling
    #[serde(default)]
    pub poll: PollConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Whether retry is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of invocations, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Give up once this many seconds have passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_elapsed_secs: Option<u64>,

    /// Add up to 25% random jitter to each delay
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_elapsed_secs: None,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> BackoffPolicy {
        if !self.enabled {
            return BackoffPolicy::no_retry();
        }
        let mut policy = BackoffPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
        .with_max_attempts(self.max_attempts);
        if let Some(secs) = self.max_elapsed_secs {
            policy = policy.with_max_elapsed(Duration::from_secs(secs));
        }
        if self.jitter {
            policy = policy.with_jitter(RandomJitter);
        }
        policy
    }
}

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// First wait between status fetches in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Longest wait between status fetches in milliseconds
    #[serde(default = "default_poll_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Stop waiting after this many seconds; unset waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Server-side wait or plain get
    #[serde(default)]
    pub method: StatusMethod,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_interval_ms: default_poll_max_interval_ms(),
            timeout_secs: None,
            method: StatusMethod::default(),
        }
    }
}

impl PollConfig {
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.max_interval_ms),
        )
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout of server-side `/wait` status fetches in seconds
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    10
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_poll_max_interval_ms() -> u64 {
    10_000
}

fn default_http_timeout_secs() -> u64 {
    60
}

fn default_wait_timeout_secs() -> u64 {
    DEFAULT_WAIT_TIMEOUT.as_secs()
}
