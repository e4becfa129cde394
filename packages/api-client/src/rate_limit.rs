use std::future::Future;
use std::time::Duration;

use common::retry::exponential_delay;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::warn;

use crate::config::ApiClientConfig;
use crate::error::ApiError;

/// Enforces a minimum interval between requests.
///
/// The lock is held while waiting, so concurrent callers are released one
/// interval apart.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Waits until a request may be sent and records it as sent.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            if ready_at > Instant::now() {
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): `retry_delay * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        exponential_delay(self.retry_delay_ms, retry)
    }
}

/// Throttle plus retry-on-throttling for one client instance.
#[derive(Debug)]
pub struct RateLimiter {
    throttle: Throttle,
    policy: RetryPolicy,
}

impl RateLimiter {
    pub fn new(throttle: Throttle, policy: RetryPolicy) -> Self {
        Self { throttle, policy }
    }

    pub fn from_config(config: &ApiClientConfig) -> Self {
        Self::new(
            Throttle::new(config.rate_limit_delay()),
            RetryPolicy {
                max_retries: config.max_retries,
                retry_delay_ms: config.retry_delay_ms,
            },
        )
    }

    /// Runs `request` behind the throttle, retrying rate-limit, server and
    /// timeout errors up to `max_retries` times. Other errors return at once.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut request: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut retry_count = 0;
        loop {
            self.throttle.acquire().await;
            match request().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retry_count < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retry_count);
                    warn!(
                        operation,
                        retry_count,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Graph API request failed, retrying"
                    );
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
