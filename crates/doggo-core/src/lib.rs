pub mod alert;
pub mod client;
pub mod config;
pub mod decoder;
pub mod direction;
pub mod error;
pub mod framing;
pub mod state;
pub mod stream;
pub mod submit;

// Re-export main types for convenience
pub use alert::{Alert, AlertPhase, Severity};
pub use client::ChatClient;
pub use config::Config;
pub use direction::Direction;
pub use error::{ChatError, FrameError};
pub use framing::{Frame, Framing};
pub use state::{ChatMessage, ChatRole, LogEntry, ScrollPosition, UiState};
pub use stream::{cancel_pair, CancelHandle, CancelToken, StreamEvent, StreamOutcome, StreamSummary};
pub use submit::{validate, ChatRequest, ValidationError};
