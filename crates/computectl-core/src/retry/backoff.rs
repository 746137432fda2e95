//! Exponential backoff with an attempt and elapsed-time ceiling.

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Source of the random component added to a backoff delay.
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// Return a value in `0..=max`.
    fn jitter(&self, max: Duration) -> Duration;
}

/// Adds nothing; delays are fully deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn jitter(&self, _max: Duration) -> Duration {
        Duration::ZERO
    }
}

/// Uniform jitter from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn jitter(&self, max: Duration) -> Duration {
        let max_ms = max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

/// Backoff schedule plus the point at which retrying stops.
///
/// `attempt` is 0-based: `next_delay(0)` is the wait after the first failure.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub initial: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Total invocations allowed, including the first.
    pub max_attempts: Option<u32>,
    /// Wall-clock budget for the whole sequence.
    pub max_elapsed: Option<Duration>,
    jitter: Arc<dyn JitterSource>,
}

impl Default for BackoffPolicy {
    /// RPC retry defaults: 500ms doubling to 30s, at most 10 invocations.
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30)).with_max_attempts(10)
    }
}

impl BackoffPolicy {
    /// Unbounded policy without jitter.
    pub fn new(initial: Duration, max_delay: Duration) -> Self {
        Self {
            initial,
            max_delay: max_delay.max(initial),
            max_attempts: None,
            max_elapsed: None,
            jitter: Arc::new(NoJitter),
        }
    }

    /// Poll cadence defaults: 1s doubling to 10s, no ceiling.
    pub fn polling() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(10))
    }

    /// Single invocation, never retry.
    pub fn no_retry() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO).with_max_attempts(1)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    pub fn with_jitter(mut self, jitter: impl JitterSource + 'static) -> Self {
        self.jitter = Arc::new(jitter);
        self
    }

    /// Delay to wait after the failure of 0-based `attempt`.
    ///
    /// Doubles from `initial` and saturates at `max_delay`. Jitter adds at
    /// most a quarter of the base delay and never pushes past `max_delay`.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        let base = self
            .initial
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        let jitter = self.jitter.jitter(base / 4);
        (base + jitter).min(self.max_delay)
    }

    /// Whether the sequence must stop instead of sleeping `next_delay` and
    /// making invocation number `attempts + 1`.
    pub fn exhausted(&self, attempts: u32, elapsed: Duration, next_delay: Duration) -> bool {
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return true;
        }
        self.max_elapsed
            .is_some_and(|max| elapsed.saturating_add(next_delay) > max)
    }
}
