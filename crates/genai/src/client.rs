//! HTTP client for one content-generation attempt
//!
//! POSTs `{base_url}/v1beta/models/{model}:generateContent`. The API key, when
//! present, travels in the `x-goog-api-key` header; with no key the request is
//! sent without one and the service's own rejection comes back as an error.
//! Every failure is mapped to [`Error`] here, so classification happens once.

use std::time::Duration;

use common::Secret;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::classify::classify_status;
use crate::error::{Error, Result};
use crate::request::GenerateRequest;
use crate::response::{GenerateResponse, WireErrorBody};
use crate::FailureClass;

/// Public endpoint of the generative service.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest slice of an unparseable error body kept in the error message.
const MAX_ERROR_BODY: usize = 512;

/// Generative service client. Cheap to clone; holds no key.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Client {
    /// `timeout` bounds each attempt, including reading the response body.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Full generateContent URL for `model`.
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Perform one generation attempt.
    pub async fn generate(
        &self,
        model: &str,
        key: Option<&Secret<String>>,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = key {
            let mut value = HeaderValue::from_str(key.expose())
                .map_err(|_| Error::Http("API key contains invalid header characters".into()))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        debug!(
            model,
            key = %key.map(|k| k.masked()).unwrap_or_else(|| "none".into()),
            structured = request.is_structured(),
            "sending generation request"
        );

        let body = request.to_wire()?;
        let response = self
            .http
            .post(self.endpoint(model))
            .headers(headers)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            // The status alone decides the class; an unreadable body only
            // costs the message detail.
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_status(status.as_u16(), &body));
        }

        let body = response.text().await.map_err(map_transport_error)?;
        GenerateResponse::from_body(&body)
    }
}

fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Http(e.to_string())
    }
}

/// Build the classified error for a non-success response.
fn error_from_status(status: u16, body: &str) -> Error {
    let message = match serde_json::from_str::<WireErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(code) if !parsed.error.message.is_empty() => {
                format!("{code}: {}", parsed.error.message)
            }
            Some(code) => code,
            None => parsed.error.message,
        },
        Err(_) => body.chars().take(MAX_ERROR_BODY).collect(),
    };

    match classify_status(status, body) {
        FailureClass::RateLimited => Error::RateLimited { status, message },
        FailureClass::Other => Error::Api { status, message },
    }
}
