//! Response body framings
//!
//! The chat endpoint streams assistant text in one of two shapes, picked per
//! deployment:
//!
//! - `Sse`: segments separated by a blank line, each `data: ` line holding
//!   `{"content": "..."}`
//! - `RawJson`: every chunk is a JSON object shaped like an Ollama chat
//!   response, `{"message": {"content": "..."}}`
//!
//! Both parsers work on a text accumulator: complete units are drained from
//! the front of the buffer and anything incomplete is left for the next call.

use crate::error::FrameError;
use serde::{Deserialize, Serialize};

const SSE_DELIMITER: &str = "\n\n";
const SSE_DATA_PREFIX: &str = "data: ";

/// One parsed unit of the response body
#[derive(Debug)]
pub enum Frame {
    Text(String),
    Malformed(FrameError),
}

/// Written as `sse` / `raw-json`; read with the same spellings `from_str`
/// accepts, so a config file can say `"SSE"` like the env var can
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Framing {
    #[serde(rename = "sse")]
    Sse,
    #[serde(rename = "raw-json")]
    RawJson,
}

impl TryFrom<String> for Framing {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Framing::from_str(&name)
            .ok_or_else(|| format!("unknown framing '{}', expected 'sse' or 'raw-json'", name))
    }
}

#[derive(Deserialize)]
struct SseData {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawChunk {
    message: Option<RawMessage>,
}

impl Framing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framing::Sse => "sse",
            Framing::RawJson => "raw-json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sse" => Some(Framing::Sse),
            "raw-json" | "raw_json" | "json" => Some(Framing::RawJson),
            _ => None,
        }
    }

    /// Drain every complete unit from `buffer`, leaving the remainder in place
    pub fn parse(&self, buffer: &mut String) -> Vec<Frame> {
        match self {
            Framing::Sse => {
                let Some(end) = buffer.rfind(SSE_DELIMITER) else {
                    return Vec::new();
                };
                let complete: String = buffer.drain(..end + SSE_DELIMITER.len()).collect();
                complete
                    .split(SSE_DELIMITER)
                    .flat_map(parse_sse_segment)
                    .collect()
            }
            Framing::RawJson => {
                // Each chunk stands on its own; a chunk that doesn't parse is
                // dropped rather than held back.
                let complete = std::mem::take(buffer);
                complete
                    .split('\n')
                    .filter(|line| !line.trim().is_empty())
                    .map(parse_raw_chunk)
                    .collect()
            }
        }
    }

    /// Parse whatever is left once the body has ended
    pub fn flush(&self, buffer: &mut String) -> Vec<Frame> {
        let mut frames = self.parse(buffer);
        if !buffer.is_empty() {
            let rest = std::mem::take(buffer);
            match self {
                Framing::Sse => frames.extend(parse_sse_segment(&rest)),
                Framing::RawJson => {
                    if !rest.trim().is_empty() {
                        frames.push(parse_raw_chunk(&rest));
                    }
                }
            }
        }
        frames
    }
}

/// Lines without the `data: ` prefix (comments, `event:` fields) are ignored
fn parse_sse_segment(segment: &str) -> Vec<Frame> {
    segment
        .lines()
        .filter_map(|line| line.strip_prefix(SSE_DATA_PREFIX))
        .map(|payload| match serde_json::from_str::<SseData>(payload) {
            Ok(SseData { content: Some(text) }) => Frame::Text(text),
            Ok(SseData { content: None }) => Frame::Malformed(FrameError::MissingContent),
            Err(e) => Frame::Malformed(e.into()),
        })
        .collect()
}

fn parse_raw_chunk(chunk: &str) -> Frame {
    match serde_json::from_str::<RawChunk>(chunk) {
        Ok(RawChunk {
            message: Some(RawMessage { content: Some(text) }),
        }) => Frame::Text(text),
        Ok(_) => Frame::Malformed(FrameError::MissingContent),
        Err(e) => Frame::Malformed(e.into()),
    }
}
