//! HTTP surface: router, shared state, and feature handlers
//!
//! Every feature endpoint takes a JSON body, runs the feature through the
//! shared [`Generator`], and answers with the feature's JSON output or a JSON
//! error body carrying a `req_` request id.

use std::future::Future;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::features::{self, Generator};
use crate::metrics::{self, ServiceMetrics};

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub generator: Generator,
    pub metrics: ServiceMetrics,
    pub prometheus: PrometheusHandle,
}

impl AppState {
    fn key_count(&self) -> usize {
        self.generator.executor().pool().len()
    }
}

/// Build the axum router with all routes and shared state.
///
/// `max_connections` bounds concurrent in-flight requests.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/exam/analyze", post(exam_handler))
        .route("/v1/frame/analyze", post(frame_handler))
        .route("/v1/tutor/chat", post(tutor_handler))
        .route("/v1/worksheet/generate", post(worksheet_handler))
        .route("/v1/solver/chat", post(solver_handler))
        .route("/v1/notebook/analyze", post(notebook_handler))
        .route("/v1/quiz/question", post(quiz_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// Reports uptime and counters. With no keys configured the service still
/// answers 200 but reports `degraded`: calls go out keyless and will likely
/// be refused upstream.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.metrics.started_at.elapsed().as_secs();
    let requests = state.metrics.requests_total.load(Ordering::Relaxed);
    let errors = state.metrics.errors_total.load(Ordering::Relaxed);
    let keys = state.key_count();
    let status = if keys > 0 { "healthy" } else { "degraded" };

    let body = serde_json::json!({
        "status": status,
        "model": state.generator.model(),
        "keys_configured": keys,
        "uptime_seconds": uptime,
        "requests_served": requests,
        "errors_total": errors,
    });

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus text exposition.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

async fn exam_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<features::exam::ExamInput>, JsonRejection>,
) -> Response {
    handle(state, "exam", body, |g, input| async move {
        features::exam::run(&g, &input).await
    })
    .await
}

async fn frame_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<features::frame::FrameInput>, JsonRejection>,
) -> Response {
    handle(state, "frame", body, |g, input| async move {
        features::frame::run(&g, &input).await
    })
    .await
}

async fn tutor_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<features::tutor::TutorInput>, JsonRejection>,
) -> Response {
    handle(state, "tutor", body, |g, input| async move {
        features::tutor::run(&g, &input).await
    })
    .await
}

async fn worksheet_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<features::worksheet::WorksheetInput>, JsonRejection>,
) -> Response {
    handle(state, "worksheet", body, |g, input| async move {
        features::worksheet::run(&g, &input).await
    })
    .await
}

async fn solver_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<features::solver::SolverInput>, JsonRejection>,
) -> Response {
    handle(state, "solver", body, |g, input| async move {
        features::solver::run(&g, &input).await
    })
    .await
}

async fn notebook_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<features::notebook::NotebookInput>, JsonRejection>,
) -> Response {
    handle(state, "notebook", body, |g, input| async move {
        features::notebook::run(&g, &input).await
    })
    .await
}

async fn quiz_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<features::quiz::QuizInput>, JsonRejection>,
) -> Response {
    handle(state, "quiz", body, |g, input| async move {
        features::quiz::run(&g, &input).await
    })
    .await
}

/// Common request lifecycle: request id, body rejection mapping, counters,
/// metrics, and one completion log line.
async fn handle<I, O, F, Fut>(
    state: AppState,
    feature: &'static str,
    body: std::result::Result<Json<I>, JsonRejection>,
    run: F,
) -> Response
where
    F: FnOnce(Generator, I) -> Fut,
    Fut: Future<Output = Result<O>>,
    O: Serialize,
{
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    let started = Instant::now();
    state.metrics.requests_total.fetch_add(1, Ordering::Relaxed);

    let result = match body {
        Ok(Json(input)) => run(state.generator.clone(), input).await,
        Err(rejection) => Err(Error::InvalidInput(rejection.body_text())),
    };

    let response = match result {
        Ok(output) => (StatusCode::OK, Json(output)).into_response(),
        Err(e) => {
            state.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
            if let Error::Upstream(ref upstream) = e {
                metrics::record_upstream_error(upstream.kind());
                warn!(%request_id, feature, error = %upstream, "upstream call failed");
            }
            e.into_response_with_id(&request_id)
        }
    };

    let status = response.status().as_u16();
    let elapsed = started.elapsed();
    metrics::record_request(feature, status, elapsed.as_secs_f64());
    info!(
        %request_id,
        feature,
        status,
        duration_ms = elapsed.as_millis() as u64,
        "request completed"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request};
    use key_pool::{KeyPool, NoDelay, RetryExecutor};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    const KEY_A: &str = "AIzaSyA-test-key-aaaaaaaa";
    const KEY_B: &str = "AIzaSyB-test-key-bbbbbbbb";

    const QUIZ_JSON: &str = r#"{"question":"What is 7 x 6?","options":["36","42","48","54"],"correctIndex":1,"explanation":"7 x 6 = 42"}"#;

    fn test_prometheus_handle() -> PrometheusHandle {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle()
    }

    fn success_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    fn rate_limited_body() -> String {
        serde_json::json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })
        .to_string()
    }

    /// Mock upstream. `reply` picks the status and body from the key header
    /// of each call; every key seen (or `<none>`) is recorded in order.
    async fn start_upstream<R>(reply: R) -> (String, Arc<Mutex<Vec<String>>>)
    where
        R: Fn(Option<&str>) -> (StatusCode, String) + Clone + Send + Sync + 'static,
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let recorded = seen.clone();
        tokio::spawn(async move {
            let app = axum::Router::new().fallback(move |headers: HeaderMap| {
                let reply = reply.clone();
                let recorded = recorded.clone();
                async move {
                    let key = headers
                        .get(genai::client::API_KEY_HEADER)
                        .and_then(|v| v.to_str().ok());
                    recorded
                        .lock()
                        .unwrap()
                        .push(key.unwrap_or("<none>").to_string());
                    reply(key)
                }
            });
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), seen)
    }

    fn test_state(base_url: &str, keys: &[&str]) -> AppState {
        let client = genai::Client::new(reqwest::Client::new(), base_url, Duration::from_secs(5));
        let pool = Arc::new(KeyPool::from_keys(keys.iter().copied()));
        let executor = RetryExecutor::new(pool, Arc::new(NoDelay));
        AppState {
            generator: Generator::new(client, executor, "gemini-2.5-flash"),
            metrics: ServiceMetrics::new(),
            prometheus: test_prometheus_handle(),
        }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy_with_keys() {
        let state = test_state("http://unused", &[KEY_A, KEY_B]);
        state.metrics.requests_total.fetch_add(3, Ordering::Relaxed);

        let response = build_router(state, 16)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["keys_configured"], 2);
        assert_eq!(json["requests_served"], 3);
        assert_eq!(json["model"], "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn health_reports_degraded_without_keys() {
        let response = build_router(test_state("http://unused", &[]), 16)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["keys_configured"], 0);
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_text() {
        let response = build_router(test_state("http://unused", &[KEY_A]), 16)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }

    #[tokio::test]
    async fn quiz_returns_generated_question() {
        let (url, seen) = start_upstream(|_| (StatusCode::OK, success_body(QUIZ_JSON))).await;
        let state = test_state(&url, &[KEY_A]);

        let response = build_router(state.clone(), 16)
            .oneshot(post_json(
                "/v1/quiz/question",
                r#"{"topic":"multiplication","difficulty":"easy"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["correctIndex"], 1);
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
        assert_eq!(*seen.lock().unwrap(), vec![KEY_A.to_string()]);
        assert_eq!(state.metrics.errors_total.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn rate_limited_key_rotates_to_next() {
        let (url, seen) = start_upstream(|key| match key {
            Some(KEY_A) => (StatusCode::TOO_MANY_REQUESTS, rate_limited_body()),
            _ => (StatusCode::OK, success_body("Each step keeps the equation balanced.")),
        })
        .await;

        let response = build_router(test_state(&url, &[KEY_A, KEY_B]), 16)
            .oneshot(post_json(
                "/v1/solver/chat",
                r#"{"message":"Solve 2x + 3 = 7"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["reply"], "Each step keeps the equation balanced.");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![KEY_A.to_string(), KEY_B.to_string()]
        );
    }

    #[tokio::test]
    async fn all_keys_rate_limited_returns_429() {
        let (url, seen) =
            start_upstream(|_| (StatusCode::TOO_MANY_REQUESTS, rate_limited_body())).await;
        let state = test_state(&url, &[KEY_A, KEY_B]);

        let response = build_router(state.clone(), 16)
            .oneshot(post_json("/v1/quiz/question", r#"{"topic":"fractions"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "rate_limited");
        assert!(
            json["error"]["request_id"]
                .as_str()
                .unwrap()
                .starts_with("req_")
        );
        // Two keys: both tried, in order.
        assert_eq!(
            *seen.lock().unwrap(),
            vec![KEY_A.to_string(), KEY_B.to_string()]
        );
        assert_eq!(state.metrics.errors_total.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn keyless_call_goes_out_once_without_header() {
        let (url, seen) =
            start_upstream(|_| (StatusCode::OK, success_body("Hello! What shall we study?"))).await;

        let response = build_router(test_state(&url, &[]), 16)
            .oneshot(post_json(
                "/v1/tutor/chat",
                r#"{"message":"hi","grounded":false}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sources"], serde_json::json!([]));
        assert_eq!(*seen.lock().unwrap(), vec!["<none>".to_string()]);
    }

    #[tokio::test]
    async fn upstream_client_error_is_not_retried() {
        let (url, seen) = start_upstream(|_| {
            (
                StatusCode::BAD_REQUEST,
                r#"{"error":{"code":400,"message":"Invalid argument","status":"INVALID_ARGUMENT"}}"#
                    .to_string(),
            )
        })
        .await;

        let response = build_router(test_state(&url, &[KEY_A, KEY_B]), 16)
            .oneshot(post_json(
                "/v1/worksheet/generate",
                r#"{"topic":"Fractions","count":5}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "upstream_error");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_json_body_is_rejected() {
        let (url, seen) = start_upstream(|_| (StatusCode::OK, success_body("unused"))).await;

        let response = build_router(test_state(&url, &[KEY_A]), 16)
            .oneshot(post_json("/v1/quiz/question", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "invalid_request");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_data_url_never_reaches_upstream() {
        let (url, seen) = start_upstream(|_| (StatusCode::OK, success_body("unused"))).await;
        let state = test_state(&url, &[KEY_A, KEY_B]);

        let response = build_router(state.clone(), 16)
            .oneshot(post_json(
                "/v1/frame/analyze",
                r#"{"image":"https://example.org/photo.png"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(seen.lock().unwrap().is_empty());
        // No key was drawn: the next call still starts at key A.
        assert_eq!(
            state.generator.executor().pool().next().unwrap().expose(),
            KEY_A
        );
    }

    #[tokio::test]
    async fn invalid_quiz_shape_is_bad_gateway() {
        let (url, _seen) = start_upstream(|_| {
            (
                StatusCode::OK,
                success_body(r#"{"question":"q","options":["a","b"],"correctIndex":0,"explanation":"e"}"#),
            )
        })
        .await;

        let response = build_router(test_state(&url, &[KEY_A]), 16)
            .oneshot(post_json("/v1/quiz/question", r#"{"topic":"x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "invalid_response");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = build_router(test_state("http://unused", &[KEY_A]), 16)
            .oneshot(post_json("/v1/unknown", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
