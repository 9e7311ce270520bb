//! Common types shared by the gateway crates

mod secret;
mod error;

pub use secret::{Secret, mask};
pub use error::{Error, Result};
