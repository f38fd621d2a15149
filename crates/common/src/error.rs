//! Error types shared across Meetcast crates.

use std::path::PathBuf;

/// Top-level error type for Meetcast operations.
#[derive(Debug, thiserror::Error)]
pub enum MeetcastError {
    #[error("Required input not found: {path}")]
    InputMissing { path: PathBuf },

    #[error("Malformed input: {message}")]
    InputMalformed { message: String },

    #[error("External tool failure: {message}")]
    Tool { message: String },

    #[error("Output failure: {message}")]
    Output { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MeetcastError.
pub type MeetcastResult<T> = Result<T, MeetcastError>;

impl MeetcastError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::InputMissing { path: path.into() }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::InputMalformed {
            message: msg.into(),
        }
    }

    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool {
            message: msg.into(),
        }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output {
            message: msg.into(),
        }
    }
}
