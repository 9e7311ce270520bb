//! Service-specific error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use genai::{Classify, FailureClass};
use thiserror::Error;

/// Per-request failures of a feature endpoint.
///
/// `InvalidInput` is raised before any key is drawn from the pool. Upstream
/// errors are the exact error of the last attempt.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(#[from] genai::Error),
}

impl Error {
    /// HTTP status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(e) if e.failure_class() == FailureClass::RateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Error::Upstream(genai::Error::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Value of the `type` field in the JSON error body.
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_request",
            Error::Upstream(e) => e.kind(),
        }
    }

    /// JSON error response: {"error":{"type":"...","message":"...","request_id":"req_..."}}
    pub fn into_response_with_id(self, request_id: &str) -> Response {
        error_response(self.status(), self.error_type(), &self.to_string(), request_id)
    }
}

impl From<genai::request::InlineDataError> for Error {
    fn from(e: genai::request::InlineDataError) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

/// Build a JSON error response.
pub fn error_response(
    status: StatusCode,
    error_type: &str,
    message: &str,
    request_id: &str,
) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
            "request_id": request_id,
        }
    });
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_per_error_kind() {
        assert_eq!(
            Error::InvalidInput("missing topic".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Upstream(genai::Error::RateLimited {
                status: 429,
                message: "quota".into()
            })
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            Error::Upstream(genai::Error::Timeout).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            Error::Upstream(genai::Error::Api {
                status: 400,
                message: "API key not valid".into()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Upstream(genai::Error::EmptyResponse).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn upstream_display_is_transparent() {
        let err = Error::Upstream(genai::Error::Timeout);
        assert_eq!(err.to_string(), "request timed out");
        assert_eq!(err.error_type(), "timeout");
    }

    #[tokio::test]
    async fn error_body_carries_type_and_request_id() {
        let resp = Error::InvalidInput("topic must not be empty".into())
            .into_response_with_id("req_abc123");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "invalid_request");
        assert_eq!(json["error"]["request_id"], "req_abc123");
        assert_eq!(
            json["error"]["message"],
            "invalid request: topic must not be empty"
        );
    }
}
