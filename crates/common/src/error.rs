//! Error types shared across Clipcam crates.

use std::path::PathBuf;

/// Top-level error type for Clipcam operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipcamError {
    #[error("Invalid frame rate: {fps}")]
    InvalidFrameRate { fps: f64 },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using ClipcamError.
pub type ClipcamResult<T> = Result<T, ClipcamError>;

impl ClipcamError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
