//! Secret wrapper for sensitive values

use std::fmt;
use zeroize::Zeroize;

/// Characters kept at the start of a masked value.
const MASK_PREFIX: usize = 8;

/// Characters kept at the end of a masked value.
const MASK_SUFFIX: usize = 4;

/// Separator standing in for the redacted middle of a masked value.
const MASK_SEPARATOR: &str = "...";

/// Sensitive value - redacted in Debug/Display/logs
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Create a new secret value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize + AsRef<str>> Secret<T> {
    /// Diagnostic form of the secret, safe to log. See [`mask`].
    pub fn masked(&self) -> String {
        mask(self.0.as_ref())
    }
}

/// Mask a credential for diagnostic output.
///
/// Keeps the first 8 and last 4 characters with `...` in between. Values too
/// short to hide anything that way are fully redacted.
pub fn mask(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count <= MASK_PREFIX + MASK_SUFFIX {
        return "[REDACTED]".to_string();
    }

    let prefix: String = value.chars().take(MASK_PREFIX).collect();
    let suffix: String = value.chars().skip(char_count - MASK_SUFFIX).collect();
    format!("{prefix}{MASK_SEPARATOR}{suffix}")
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
