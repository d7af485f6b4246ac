//! Error types for chaser-eye

use thiserror::Error;

/// Why a single frame could not be obtained; always recoverable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame request timed out")]
    Timeout,

    #[error("Frame request returned HTTP {0}")]
    Status(u16),

    #[error("Frame transport error: {0}")]
    Transport(String),

    #[error("Frame payload is empty")]
    Empty,

    #[error("Frame decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FrameError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FrameError::Timeout
        } else if let Some(status) = err.status() {
            FrameError::Status(status.as_u16())
        } else {
            FrameError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
