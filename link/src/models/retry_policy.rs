use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff schedule for retrying transient execution failures.
///
/// The delay before retry `n` (0-based) is
/// `initial_delay_ms * multiplier^n`, capped at `max_delay_ms`. Retrying
/// stops when either `max_retries` or `max_elapsed_ms` is reached; the
/// caller's cancellation token bounds the whole loop independently.
///
/// # Example
///
/// ```rust
/// use dbq_link::RetryPolicy;
///
/// let policy = RetryPolicy::default()
///     .with_initial_delay_ms(50)
///     .with_max_retries(Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry
    /// Default: 100ms
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay
    /// Default: 5000ms
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Growth factor applied per retry
    /// Default: 2.0
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum number of retries after the first attempt
    /// Default: Some(3). None retries until `max_elapsed_ms` or cancellation.
    #[serde(default = "default_max_retries")]
    pub max_retries: Option<u32>,

    /// Total time budget measured from the first attempt
    /// Default: None (unbounded)
    #[serde(default)]
    pub max_elapsed_ms: Option<u64>,
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_retries() -> Option<u32> {
    Some(3)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            multiplier: 2.0,
            max_retries: Some(3),
            max_elapsed_ms: None,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short delays for local databases and tests.
    pub fn fast() -> Self {
        Self {
            initial_delay_ms: 10,
            max_delay_ms: 200,
            multiplier: 2.0,
            max_retries: Some(3),
            max_elapsed_ms: Some(2_000),
        }
    }

    /// Patient schedule for remote or flaky networks.
    pub fn relaxed() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 1.5,
            max_retries: Some(10),
            max_elapsed_ms: Some(300_000),
        }
    }

    pub fn with_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Pass None for unlimited retries, Some(0) to disable retrying
    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_elapsed_ms(mut self, max_elapsed_ms: Option<u64>) -> Self {
        self.max_elapsed_ms = max_elapsed_ms;
        self
    }

    /// Delay to wait before retry number `retry` (0-based).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay_ms = (self.initial_delay_ms as f64) * multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Whether another retry fits in the budget after `retries_done` retries,
    /// given `elapsed` time since the first attempt.
    pub fn allows_retry(&self, retries_done: u32, elapsed: Duration) -> bool {
        if let Some(max) = self.max_retries {
            if retries_done >= max {
                return false;
            }
        }
        if let Some(max_elapsed_ms) = self.max_elapsed_ms {
            let next = elapsed + self.delay_for_attempt(retries_done);
            if next > Duration::from_millis(max_elapsed_ms) {
                return false;
            }
        }
        true
    }
}
