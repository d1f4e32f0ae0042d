use crate::direction::Direction;
use thiserror::Error;

/// A validated request, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a message before submitting.")]
    EmptyMessage,
    #[error("Please select a valid translation direction.")]
    InvalidDirection(String),
}

/// Check the form inputs before any request is issued.
///
/// The message is taken as typed: whitespace is not trimmed, only an empty
/// string is rejected.
pub fn validate(message: &str, direction: &str) -> Result<ChatRequest, ValidationError> {
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }

    let direction = Direction::from_str(direction)
        .ok_or_else(|| ValidationError::InvalidDirection(direction.to_string()))?;

    Ok(ChatRequest {
        message: message.to_string(),
        direction,
    })
}
