//! Backoff between rate-limited attempts
//!
//! The delay is a capability handed to `RetryExecutor` so tests and tools can
//! swap the randomized sleep for something deterministic.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rand::RngExt;

/// Base backoff before retrying with the next key.
pub const BACKOFF_BASE: Duration = Duration::from_millis(200);

/// Upper bound (exclusive) of the random jitter added to [`BACKOFF_BASE`].
pub const BACKOFF_JITTER: Duration = Duration::from_millis(300);

/// Waits between attempts. `attempt` is the 1-based number of the attempt
/// that just failed.
///
/// Uses `Pin<Box<dyn Future>>` so executors can hold an `Arc<dyn Delay>`.
pub trait Delay: Send + Sync {
    fn wait(&self, attempt: u32) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// `BACKOFF_BASE` plus uniform jitter in `[0, BACKOFF_JITTER)`, slept on the
/// tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JitteredDelay;

impl JitteredDelay {
    /// Draw one backoff duration.
    pub fn sample(&self) -> Duration {
        let jitter_ms = rand::rng().random_range(0..BACKOFF_JITTER.as_millis() as u64);
        BACKOFF_BASE + Duration::from_millis(jitter_ms)
    }
}

impl Delay for JitteredDelay {
    fn wait(&self, _attempt: u32) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let delay = self.sample();
        Box::pin(tokio::time::sleep(delay))
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn wait(&self, _attempt: u32) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(std::future::ready(()))
    }
}
