use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single failed attempt, kept on a job for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Error message from the failed attempt.
    pub error: String,
    /// When this attempt occurred.
    pub timestamp: DateTime<Utc>,
}

impl RetryAttempt {
    pub fn new(attempt: u32, error: impl Into<String>) -> Self {
        Self {
            attempt,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Delay policy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    Fixed { delay_ms: u64 },
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Backoff {
    pub fn exponential(base_ms: u64) -> Self {
        Self::Exponential {
            base_ms,
            max_ms: u64::MAX,
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential { base_ms, max_ms } => {
                exponential_delay(base_ms, attempt.saturating_sub(1)).min(Duration::from_millis(max_ms))
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::exponential(2000)
    }
}

/// `base_ms * 2^exponent`, saturating.
pub fn exponential_delay(base_ms: u64, exponent: u32) -> Duration {
    let factor = 2u64.saturating_pow(exponent);
    Duration::from_millis(base_ms.saturating_mul(factor))
}
