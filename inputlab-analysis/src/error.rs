use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LabError>;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("assumed sample rate must be positive and finite, got {0}")]
    SampleRate(f64),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("sliding window ({window_ms} ms) cannot exceed the test duration ({duration_ms} ms)")]
    WindowTooLong { window_ms: u64, duration_ms: u64 },
}

impl LabError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LabError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        LabError::Json {
            path: path.into(),
            source,
        }
    }
}
