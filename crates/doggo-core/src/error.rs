use std::time::Duration;
use thiserror::Error;

/// Failures that end a chat request before the body is fully read
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat endpoint returned status {0}")]
    Status(u16),
    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),
    #[error("stream error: {0}")]
    Stream(String),
}

/// A single frame that could not be turned into a fragment
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload has no content field")]
    MissingContent,
}
