//! API key rotation and retry for generative service calls
//!
//! Holds a fixed, ordered pool of API keys and hands them out round-robin.
//! `RetryExecutor` wraps one logical call with a bounded retry loop that draws
//! a fresh key for every attempt:
//!
//! 1. Budget is `min(pool size, 5)`, or a single keyless attempt when the pool is empty
//! 2. Each attempt calls `KeyPool::next()` and runs the caller's operation with that key
//! 3. Success returns immediately
//! 4. A `RateLimited` failure waits a jittered backoff and moves on to the next key
//! 5. Any other failure is returned to the caller untouched
//! 6. When the budget runs out, the last rate-limit error is returned

pub mod delay;
pub mod pool;
pub mod retry;

pub use delay::{Delay, JitteredDelay, NoDelay};
pub use pool::{KeyPool, MAX_ATTEMPTS};
pub use retry::RetryExecutor;
