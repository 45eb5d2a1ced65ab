// Shared wire types and application state

use serde::Serialize;
use std::sync::Arc;

use crate::core::config::Config;
use crate::middleware::RateLimiter;
use crate::services::TesseractEngine;
use crate::utils::Metrics;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<TesseractEngine>,
    pub limiter: Arc<RateLimiter>,
    pub metrics: Metrics,
}

/// Successful detection response body
#[derive(Debug, Serialize)]
pub struct DetectTextResponse {
    pub text: String,
}

/// Error response body shared by all failure statuses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health probe response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tesseract_status: String,
    pub version: &'static str,
}

/// Outcome of a recognition call.
///
/// `empty` distinguishes "the engine ran and found nothing" from text
/// being present; an empty page is a valid result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub text: String,
    pub empty: bool,
}

impl RecognitionResult {
    /// Literal text returned when the engine finds no text at all.
    pub const NO_TEXT_SENTINEL: &'static str = "No text detected in the image.";

    /// Normalize raw engine output: trim surrounding whitespace and map
    /// an all-whitespace result to the sentinel with `empty` set.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self {
                text: Self::NO_TEXT_SENTINEL.to_string(),
                empty: true,
            }
        } else {
            Self {
                text: trimmed.to_string(),
                empty: false,
            }
        }
    }
}
