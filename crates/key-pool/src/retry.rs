//! Retry loop with key rotation
//!
//! `execute_with_retry` runs a caller-supplied operation once per attempt,
//! each time with a freshly issued key. Only failures classified as
//! `RateLimited` lead to another attempt, since a different key is the only
//! remedy on offer. Errors are never wrapped or replaced: the caller gets the
//! exact error value from the last attempt.

use std::future::Future;
use std::sync::Arc;

use common::Secret;
use genai::{Classify, FailureClass};
use tracing::{debug, warn};

use crate::delay::Delay;
use crate::pool::KeyPool;

/// Runs operations against a shared [`KeyPool`] with bounded retries.
#[derive(Clone)]
pub struct RetryExecutor {
    pool: Arc<KeyPool>,
    delay: Arc<dyn Delay>,
}

impl RetryExecutor {
    pub fn new(pool: Arc<KeyPool>, delay: Arc<dyn Delay>) -> Self {
        Self { pool, delay }
    }

    pub fn pool(&self) -> &Arc<KeyPool> {
        &self.pool
    }

    /// Execute `operation` with automatic key rotation.
    ///
    /// At most `pool.retry_budget()` invocations. With an empty pool the
    /// operation runs exactly once with `None`. The operation may be invoked
    /// several times and must be safe to repeat.
    pub async fn execute_with_retry<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(Option<Secret<String>>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::fmt::Display,
    {
        let budget = self.pool.retry_budget();
        let mut attempt: usize = 1;

        loop {
            let key = self.pool.next();
            let err = match operation(key).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, budget, "succeeded after rotating keys");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            match err.failure_class() {
                FailureClass::Other => {
                    debug!(attempt, error = %err, "non-retryable failure");
                    return Err(err);
                }
                FailureClass::RateLimited if attempt >= budget => {
                    warn!(attempts = attempt, error = %err, "all retry attempts rate limited");
                    metrics::counter!("genai_rate_limited_total").increment(1);
                    metrics::counter!("genai_retry_exhausted_total").increment(1);
                    return Err(err);
                }
                FailureClass::RateLimited => {
                    warn!(
                        attempt,
                        budget,
                        error = %err,
                        "rate limited, rotating to next key"
                    );
                    metrics::counter!("genai_rate_limited_total").increment(1);
                    self.delay.wait(attempt as u32).await;
                    attempt += 1;
                }
            }
        }
    }
}
