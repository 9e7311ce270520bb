//! Key pool and round-robin rotation
//!
//! The pool is parsed once from a comma-separated value and never changes.
//! Only the rotation cursor moves: every `next()` call advances it by one,
//! whether or not the issued key later succeeds. The cursor update is a single
//! atomic read-modify-write with no suspension point, so concurrent callers
//! always receive distinct, consecutive positions.

use std::sync::atomic::{AtomicUsize, Ordering};

use common::Secret;
use tracing::debug;

/// Ceiling on attempts for one logical call, however large the pool.
pub const MAX_ATTEMPTS: usize = 5;

/// Ordered, immutable set of API keys with a shared rotation cursor.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<Secret<String>>,
    next_index: AtomicUsize,
}

impl KeyPool {
    /// Build a pool from a comma-separated list. Entries are trimmed and empty
    /// entries dropped; an empty or blank value yields an empty pool.
    pub fn from_config(raw: &str) -> Self {
        Self::from_keys(raw.split(','))
    }

    /// Build a pool from individual keys, with the same trimming rules as
    /// [`KeyPool::from_config`].
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<Secret<String>> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Secret::new)
            .collect();
        debug!(keys = keys.len(), "key pool configured");
        Self {
            keys,
            next_index: AtomicUsize::new(0),
        }
    }

    /// Build a pool from an environment variable. A missing variable is the
    /// same as an empty one.
    pub fn from_env(var: &str) -> Self {
        Self::from_config(&std::env::var(var).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Attempts allowed for one logical call: `min(len, MAX_ATTEMPTS)`, or a
    /// single keyless attempt when the pool is empty.
    pub fn retry_budget(&self) -> usize {
        if self.keys.is_empty() {
            1
        } else {
            self.keys.len().min(MAX_ATTEMPTS)
        }
    }

    /// Issue the key under the cursor and advance the cursor, wrapping at the
    /// pool size. Returns `None` when the pool is empty; the caller then
    /// proceeds without a key.
    pub fn next(&self) -> Option<Secret<String>> {
        let n = self.keys.len();
        if n == 0 {
            debug!("key pool empty, proceeding without a key");
            return None;
        }

        let index = self
            .next_index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % n))
            .unwrap_or_else(|i| i);
        let key = &self.keys[index];

        debug!(
            key = %key.masked(),
            "issued key #{} of {}",
            index + 1,
            n
        );
        metrics::counter!("genai_keys_issued_total").increment(1);

        Some(key.clone())
    }

    /// Masked form of every key, in pool order.
    pub fn masked_keys(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.masked()).collect()
    }
}
