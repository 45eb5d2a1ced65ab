// Custom error types for better error handling and debugging
//
// Using thiserror for ergonomic error definitions with:
// - Context preservation
// - Type-safe error matching
// - Automatic Display/Error trait implementations
// - Source error chaining

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

use crate::core::types::ErrorResponse;

/// Request-level errors for the text detection pipeline.
///
/// Every failure raised inside decode/preprocess/recognize is classified
/// into one of these variants by the component that detects it. The HTTP
/// layer maps variants to status codes without reinterpreting them.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Request envelope missing or malformed (no image field, wrong type,
    /// body not JSON).
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid image format: expected a data URL of the form data:<media-type>;base64,<payload>")]
    InvalidFormat,

    #[error("Unsupported image type '{media_type}'. Allowed types: jpeg, png, gif, bmp")]
    UnsupportedType { media_type: String },

    #[error("Invalid image data: {0}")]
    InvalidData(String),

    #[error("Image dimensions {width}x{height} exceed the maximum of {max} pixels per side")]
    DimensionTooLarge { width: u32, height: u32, max: u32 },

    #[error("Image size {actual_mib:.2} MiB exceeds the maximum of {max_mib:.2} MiB")]
    SizeTooLarge { actual_mib: f64, max_mib: f64 },

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Text recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Anything unanticipated. The precise cause is logged but never sent
    /// to the client.
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl DetectError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::EngineUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, error = ?self, "request failed");
        } else {
            warn!(status = %status, "request rejected: {self}");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Recognition engine errors, converted into `DetectError` at the
/// service façade boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tesseract not found; set TESSERACT_PATH or install Tesseract OCR and ensure it is on PATH")]
    NotFound,

    #[error("TESSERACT_PATH points to '{}' but no executable exists there", .0.display())]
    BadOverride(PathBuf),

    #[error("failed to encode image for the engine: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to run tesseract: {0}")]
    Io(#[from] std::io::Error),

    #[error("tesseract did not finish within {0:?}")]
    Timeout(Duration),

    #[error("tesseract exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

impl From<EngineError> for DetectError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::NotFound
            | EngineError::BadOverride(_)
            | EngineError::Io(_)
            | EngineError::Timeout(_) => DetectError::EngineUnavailable(err.to_string()),
            EngineError::Encode(_) | EngineError::Failed { .. } => {
                DetectError::Internal(err.into())
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RATE_LIMIT_MAX_REQUESTS must be > 0")]
    InvalidRateLimit,

    #[error("RATE_LIMIT_WINDOW_SECONDS must be > 0")]
    InvalidRateWindow,

    #[error("ENGINE_TIMEOUT_SECONDS must be > 0")]
    InvalidEngineTimeout,

    #[error("invalid allowed origin '{0}'")]
    InvalidOrigin(String),
}

// Convenience type alias for request-level Results
pub type DetectResult<T> = Result<T, DetectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            DetectError::InvalidRequest("No image data provided".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DetectError::InvalidFormat.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DetectError::UnsupportedType {
                media_type: "image/tiff".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DetectError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            DetectError::EngineUnavailable("gone".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DetectError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        let err = DetectError::Internal(anyhow::anyhow!("secret database detail"));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_size_message_uses_two_decimal_mib() {
        let err = DetectError::SizeTooLarge {
            actual_mib: 12.3456,
            max_mib: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "Image size 12.35 MiB exceeds the maximum of 10.00 MiB"
        );
    }

    #[test]
    fn test_engine_timeout_maps_to_unavailable() {
        let err: DetectError = EngineError::Timeout(Duration::from_secs(30)).into();
        assert!(matches!(err, DetectError::EngineUnavailable(_)));
    }

    #[test]
    fn test_engine_crash_maps_to_internal() {
        use std::process::Command;
        // Obtain a real non-zero ExitStatus portably
        let status = Command::new("false")
            .status()
            .or_else(|_| Command::new("cmd").args(["/C", "exit 1"]).status());
        if let Ok(status) = status {
            let err: DetectError = EngineError::Failed {
                status,
                stderr: "boom".into(),
            }
            .into();
            assert!(matches!(err, DetectError::Internal(_)));
        }
    }
}
