//! UI-agnostic application state
//!
//! Everything the chat screen shows lives in `UiState` and only changes
//! through the methods below, so the render side is a projection of this
//! struct and the request lifecycle can be tested without a terminal.

use crate::alert::{Alert, Severity};
use crate::direction::Direction;
use crate::stream::StreamOutcome;
use crate::submit::{self, ChatRequest};
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const TRANSPORT_ERROR_TEXT: &str = "Something went wrong. Please try again later.";
pub const CANCELLED_TEXT: &str = "Request cancelled.";

/// A chat message in the log, stored as display lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub lines: Vec<String>,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatMessage {
    pub fn user(text: &str) -> Self {
        let mut message = Self {
            role: ChatRole::User,
            lines: vec![String::new()],
        };
        message.append(text);
        message
    }

    pub fn assistant() -> Self {
        Self {
            role: ChatRole::Assistant,
            lines: vec![String::new()],
        }
    }

    /// Append a fragment, turning each `\n` into a line break
    pub fn append(&mut self, fragment: &str) {
        let mut pieces = fragment.split('\n');
        if let Some(first) = pieces.next() {
            match self.lines.last_mut() {
                Some(last) => last.push_str(first),
                None => self.lines.push(first.to_string()),
            }
        }
        self.lines.extend(pieces.map(str::to_string));
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Message(ChatMessage),
    /// End of a request, successful or not
    Separator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPosition {
    /// Pinned to the newest content
    Bottom,
    Offset(u16),
}

impl ScrollPosition {
    pub fn resolve(&self, max: u16) -> u16 {
        match self {
            ScrollPosition::Bottom => max,
            ScrollPosition::Offset(offset) => (*offset).min(max),
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub input: String,
    pub cursor: usize,
    pub direction: Direction,
    pub alert: Alert,
    pub scroll: ScrollPosition,
    busy: bool,
    log: Vec<LogEntry>,
}

impl UiState {
    pub fn new(direction: Direction, alert: Alert) -> Self {
        Self {
            input: String::new(),
            cursor: 0,
            direction,
            alert,
            scroll: ScrollPosition::Bottom,
            busy: false,
            log: Vec::new(),
        }
    }

    /// A request is in flight: busy indicator shown, submit disabled
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Validate the form and, if it passes, start a request.
    ///
    /// Returns the request to send. While busy the submit control is
    /// disabled, so this returns `None` without touching anything.
    pub fn submit(&mut self, now: Instant) -> Option<ChatRequest> {
        if self.busy {
            return None;
        }

        match submit::validate(&self.input, self.direction.as_str()) {
            Ok(request) => {
                self.begin_request(&request);
                Some(request)
            }
            Err(e) => {
                tracing::debug!("submission rejected: {:?}", e);
                self.alert.present(e.to_string(), Severity::Error, now);
                None
            }
        }
    }

    /// Disable submit, show the busy indicator, clear the input and open the
    /// turn in the log. Runs before the first byte of the response arrives.
    pub fn begin_request(&mut self, request: &ChatRequest) {
        self.busy = true;
        self.input.clear();
        self.cursor = 0;
        self.log.push(LogEntry::Message(ChatMessage::user(&request.message)));
        self.log.push(LogEntry::Message(ChatMessage::assistant()));
        self.scroll = ScrollPosition::Bottom;
    }

    /// Render sink: append one fragment to the assistant reply and keep the
    /// log scrolled to the newest content
    pub fn push_fragment(&mut self, fragment: &str) {
        match self.log.last_mut() {
            Some(LogEntry::Message(message)) if message.role == ChatRole::Assistant => {
                message.append(fragment);
            }
            _ => {
                let mut message = ChatMessage::assistant();
                message.append(fragment);
                self.log.push(LogEntry::Message(message));
            }
        }
        self.scroll = ScrollPosition::Bottom;
    }

    /// Finalize the in-flight request. Only the first call per request has
    /// any effect; returns whether this call finalized.
    pub fn finish(&mut self, outcome: &StreamOutcome, now: Instant) -> bool {
        if !self.busy {
            return false;
        }

        self.log.push(LogEntry::Separator);
        self.busy = false;
        self.scroll = ScrollPosition::Bottom;

        match outcome {
            StreamOutcome::Completed(_) => {}
            StreamOutcome::Failed(_) => {
                self.alert.present(TRANSPORT_ERROR_TEXT, Severity::Error, now);
            }
            StreamOutcome::Cancelled => {
                self.alert.present(CANCELLED_TEXT, Severity::Info, now);
            }
        }
        true
    }

    /// Advance timers. Returns true if anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.alert.poll(now)
    }

    /// Scrolling is held while a request runs or an alert is up
    pub fn scroll_locked(&self) -> bool {
        self.busy || self.alert.is_shown()
    }

    /// Move the log view by `delta` lines given the current maximum offset
    pub fn scroll_by(&mut self, delta: i32, max: u16) {
        if self.scroll_locked() {
            return;
        }
        let current = self.scroll.resolve(max) as i32;
        let next = (current + delta).clamp(0, max as i32) as u16;
        self.scroll = if next >= max {
            ScrollPosition::Bottom
        } else {
            ScrollPosition::Offset(next)
        };
    }

    pub fn toggle_direction(&mut self) -> Direction {
        self.direction = self.direction.toggle();
        self.direction
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}
