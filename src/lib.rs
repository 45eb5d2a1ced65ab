// Library exports for the text detection service

pub mod core;
pub mod middleware;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use crate::core::{
    config::Config,
    errors::{ConfigError, DetectError, EngineError},
    types::{AppState, RecognitionResult},
};

pub use crate::middleware::RateLimiter;

pub use crate::services::{decoder, preprocess, TesseractEngine};

pub use crate::utils::Metrics;
