//! Quota detection for generative service error responses
//!
//! A 429 is always a quota/throughput rejection. Some deployments also report
//! exhausted quota under other statuses with a `RESOURCE_EXHAUSTED` status
//! string or a quota message, so the body is checked as well. Anything else
//! is terminal: a different key would not fix it.

use crate::FailureClass;

/// Message fragments that mark a quota rejection, matched case-insensitively.
const QUOTA_PATTERNS: &[&str] = &[
    "resource_exhausted",
    "resource exhausted",
    "resource has been exhausted",
    "quota",
];

/// Classify an error response by HTTP status and response body.
pub fn classify_status(status: u16, body: &str) -> FailureClass {
    if status == 429 || is_quota_message(body) {
        FailureClass::RateLimited
    } else {
        FailureClass::Other
    }
}

/// Whether an error message reports exhausted quota.
pub fn is_quota_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    QUOTA_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}
