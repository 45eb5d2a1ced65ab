use crate::core::errors::ConfigError;
use axum::http::HeaderValue;
use std::env;
use std::path::PathBuf;
use tracing::Level;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
}

/// Cross-origin access configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Recognition engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit tesseract binary location, checked before any default
    /// search locations.
    pub override_path: Option<PathBuf>,
    pub timeout_seconds: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub engine: EngineConfig,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env();
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Self {
        // DEBUG affects logging verbosity only, never behavior
        let debug = env::var("DEBUG")
            .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                log_level: if debug { Level::DEBUG } else { Level::INFO },
            },
            cors: CorsConfig { allowed_origins },
            engine: EngineConfig {
                override_path: env::var("TESSERACT_PATH")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from),
                timeout_seconds: env::var("ENGINE_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
            rate_limit: RateLimitConfig {
                max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
                window_seconds: env::var("RATE_LIMIT_WINDOW_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }
        if self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::InvalidRateWindow);
        }
        if self.engine.timeout_seconds == 0 {
            return Err(ConfigError::InvalidEngineTimeout);
        }

        // Origins land in CORS response headers, so each must be a valid
        // header value
        for origin in &self.cors.allowed_origins {
            if origin.parse::<HeaderValue>().is_err() {
                return Err(ConfigError::InvalidOrigin(origin.clone()));
            }
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
