// Tesseract recognition adapter
//
// Resolves the tesseract binary once at startup and invokes it per
// request over stdin/stdout with a fixed configuration: --oem 3 (legacy
// + LSTM engines) and --psm 6 (uniform block of text).

use image::GrayImage;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::core::config::EngineConfig;
use crate::core::errors::EngineError;
use crate::core::types::RecognitionResult;
use crate::utils::image_ops;

#[cfg(windows)]
const BINARY_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const BINARY_NAME: &str = "tesseract";

/// Well-known install locations, checked after the configured override.
const DEFAULT_SEARCH_PATHS: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    r"C:\Tesseract-OCR\tesseract.exe",
];

pub struct TesseractEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl TesseractEngine {
    /// Locate the tesseract binary.
    ///
    /// The configured override is checked first and must exist when set;
    /// otherwise well-known install locations and every PATH entry are
    /// searched. Resolution runs once at startup so request handling
    /// never consults ambient state.
    pub fn resolve(config: &EngineConfig) -> Result<Self, EngineError> {
        let timeout = Duration::from_secs(config.timeout_seconds);

        if let Some(override_path) = &config.override_path {
            if override_path.is_file() {
                info!("tesseract found at {} (override)", override_path.display());
                return Ok(Self {
                    binary: override_path.clone(),
                    timeout,
                });
            }
            return Err(EngineError::BadOverride(override_path.clone()));
        }

        for candidate in DEFAULT_SEARCH_PATHS {
            let path = Path::new(candidate);
            if path.is_file() {
                info!("tesseract found at {}", path.display());
                return Ok(Self {
                    binary: path.to_path_buf(),
                    timeout,
                });
            }
        }

        if let Some(path) = search_path_env() {
            info!("tesseract found on PATH at {}", path.display());
            return Ok(Self {
                binary: path,
                timeout,
            });
        }

        Err(EngineError::NotFound)
    }

    /// Build an engine around an explicit binary, bypassing resolution.
    pub fn with_binary(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Human-readable engine state for the health probe.
    ///
    /// Re-checks the resolved path so the probe stays truthful if the
    /// binary is removed while the service is running.
    pub fn status(&self) -> String {
        if self.binary.is_file() {
            format!("found at {}", self.binary.display())
        } else {
            format!("missing: {} no longer exists", self.binary.display())
        }
    }

    /// Run recognition on a preprocessed image.
    ///
    /// The engine's output is trimmed; a blank page yields the sentinel
    /// result with `empty` set rather than an error.
    pub async fn recognize(&self, image: &GrayImage) -> Result<RecognitionResult, EngineError> {
        let png = image_ops::encode_gray_png(image)?;

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "--oem", "3", "--psm", "6"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "child stdin unavailable",
            ))
        })?;
        stdin.write_all(&png).await?;
        drop(stdin);

        // kill_on_drop reaps the child when the timeout abandons it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(EngineError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EngineError::Failed {
                status: output.status,
                stderr,
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let result = RecognitionResult::from_raw(&raw);
        debug!(empty = result.empty, "recognition completed");
        Ok(result)
    }
}

fn search_path_env() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(BINARY_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
