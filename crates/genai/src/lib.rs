//! Client for the generative content-completion service
//!
//! Models the request shape (content parts, system instruction, grounding
//! tools, response schema), performs one HTTP attempt with an optional API
//! key, and turns every failure into an [`Error`] that is classified exactly
//! once as [`FailureClass::RateLimited`] or [`FailureClass::Other`]. Retry and
//! key rotation live in the `key-pool` crate and only ever look at the class.

pub mod classify;
pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod schema;

pub use classify::classify_status;
pub use client::Client;
pub use error::{Error, Result};
pub use request::{Content, GenerateRequest, InlineData, Part, Role, Tool};
pub use response::{Citation, GenerateResponse};
pub use schema::Schema;

/// Classification of a failed attempt, used to decide whether trying another
/// key can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Quota or throughput exhausted for the key in use; rotate and retry.
    RateLimited,
    /// Anything else. Terminal for the logical call.
    Other,
}

/// Errors that know their own [`FailureClass`].
pub trait Classify {
    fn failure_class(&self) -> FailureClass;
}
