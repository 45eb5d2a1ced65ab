// HTTP façade: routes, per-request orchestration, and error mapping
//
// The sole place where pipeline failures are classified onto the wire
// contract. Admission runs as route middleware before the handler;
// decode and binarization are CPU-bound and run on the blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use std::time::Instant;
use tokio::task;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::core::errors::DetectError;
use crate::core::types::{AppState, DetectTextResponse, HealthResponse};
use crate::middleware::rate_limiter::admission_guard;
use crate::services::{decoder, preprocess};

/// Transport-level request body cap. Base64 inflates payloads by 4/3, so
/// this sits comfortably above the 10 MiB image size limit.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .route("/api/detect-text", post(detect_text))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admission_guard,
        ))
        .route("/api/health", get(health))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    // Config validation already vets origins; unparseable ones are
    // skipped here
    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring unparseable allowed origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn detect_text(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<DetectTextResponse>, DetectError> {
    state.metrics.record_request("/api/detect-text");
    let started = Instant::now();

    let result = run_detection(&state, payload).await;
    state
        .metrics
        .record_detection(result.is_ok(), started.elapsed());

    result.map(|text| Json(DetectTextResponse { text }))
}

async fn run_detection(
    state: &AppState,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<String, DetectError> {
    let Json(body) = payload
        .map_err(|_| DetectError::InvalidRequest("Request body must be JSON".to_string()))?;
    let image_field = extract_image_field(&body)?;

    let binary = task::spawn_blocking(move || {
        let decoded = decoder::validate_and_decode(&image_field)?;
        Ok::<_, DetectError>(preprocess::binarize(&decoded.image))
    })
    .await
    .map_err(|e| DetectError::Internal(anyhow::anyhow!("image processing task failed: {e}")))??;

    let recognition = state.engine.recognize(&binary).await?;
    if recognition.empty {
        state.metrics.record_empty_result();
    }
    info!(
        chars = recognition.text.len(),
        empty = recognition.empty,
        "text detection completed"
    );

    Ok(recognition.text)
}

fn extract_image_field(body: &serde_json::Value) -> Result<String, DetectError> {
    match body.get("image") {
        None | Some(serde_json::Value::Null) => Err(DetectError::InvalidRequest(
            "No image data provided".to_string(),
        )),
        Some(serde_json::Value::String(data_url)) => Ok(data_url.clone()),
        Some(_) => Err(DetectError::InvalidRequest(
            "Image data must be a string".to_string(),
        )),
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    state.metrics.record_request("/api/health");
    Json(HealthResponse {
        status: "healthy",
        tesseract_status: state.engine.status(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.record_request("/metrics");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}
