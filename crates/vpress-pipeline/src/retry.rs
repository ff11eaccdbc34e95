//! Per-call retry policies.
//!
//! Two backoff shapes cover the pipeline's remote calls: a fixed wait
//! between attempts (binary uploads) and a uniformly randomized wait
//! inside a window (metadata calls, where jitter spreads concurrent
//! workers apart). A server-provided Retry-After can lengthen a wait
//! but never shorten it below the policy.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// How long to wait between attempts.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// Same delay every time.
    Fixed(Duration),
    /// Uniform random delay in `[min, max]` per attempt.
    Randomized { min: Duration, max: Duration },
}

impl Backoff {
    fn delay(&self) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Randomized { min, max } => {
                let span_ms = max.as_millis().saturating_sub(min.as_millis()) as u64;
                let jitter = rand::rng().random_range(0..=span_ms);
                min + Duration::from_millis(jitter)
            }
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait policy between attempts.
    pub backoff: Backoff,
    /// Operation name for logging.
    pub operation_name: String,
}

impl RetryConfig {
    /// Fixed-delay policy.
    pub fn fixed(name: impl Into<String>, max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
            operation_name: name.into(),
        }
    }

    /// Randomized-window policy.
    pub fn randomized(
        name: impl Into<String>,
        max_attempts: u32,
        min: Duration,
        max: Duration,
    ) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Randomized { min, max },
            operation_name: name.into(),
        }
    }
}

/// Execute an async operation with retry.
///
/// `should_retry` decides whether an error is worth another attempt;
/// a non-retryable error, or exhaustion of `max_attempts`, returns the
/// last error. `retry_after_ms` extracts a server-requested minimum
/// wait from the error, honored when it exceeds the policy delay.
pub async fn retry_async<F, Fut, T, E, P, A>(
    config: &RetryConfig,
    op: F,
    should_retry: P,
    retry_after_ms: A,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    A: Fn(&E) -> Option<u64>,
{
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts && should_retry(&e) => {
                let mut delay = config.backoff.delay();
                if let Some(after_ms) = retry_after_ms(&e) {
                    delay = delay.max(Duration::from_millis(after_ms));
                }
                warn!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, config.max_attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
