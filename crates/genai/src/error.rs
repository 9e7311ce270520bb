//! Error types for generative service calls

use crate::{Classify, FailureClass};

/// Errors from one attempt against the generative service.
///
/// Classification is fixed by the variant: only `RateLimited` is retryable
/// with another key.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("rate limited ({status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("service returned no generated text")]
    EmptyResponse,

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("request could not be encoded: {0}")]
    Encode(String),
}

impl Error {
    /// Short label for metrics and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::RateLimited { .. } => "rate_limited",
            Error::Api { .. } => "upstream_error",
            Error::Timeout => "timeout",
            Error::Http(_) => "connection",
            Error::EmptyResponse => "empty_response",
            Error::Decode(_) => "invalid_response",
            Error::Encode(_) => "encode_error",
        }
    }
}

impl Classify for Error {
    fn failure_class(&self) -> FailureClass {
        match self {
            Error::RateLimited { .. } => FailureClass::RateLimited,
            _ => FailureClass::Other,
        }
    }
}

/// Result alias for generative service calls.
pub type Result<T> = std::result::Result<T, Error>;
