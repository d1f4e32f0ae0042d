//! Streaming response consumer
//!
//! `frames` turns a chunked byte body into a lazy sequence of parsed frames.
//! `consume` drives that sequence into a render sink and reports how it ended.

use crate::decoder::Utf8Decoder;
use crate::error::ChatError;
use crate::framing::{Frame, Framing};
use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Messages from a running request to whoever owns the UI state
#[derive(Debug)]
pub enum StreamEvent {
    Fragment(String),
    Finished(StreamOutcome),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub fragments: usize,
    pub malformed: usize,
}

/// How a response stream ended. Exactly one is produced per request.
#[derive(Debug)]
pub enum StreamOutcome {
    Completed(StreamSummary),
    Failed(ChatError),
    Cancelled,
}

/// Owner side of a cancellation pair. Dropping it cancels as well.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Err only means the request already finished
        let _ = self.tx.send(true);
    }
}

impl CancelToken {
    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `cancel` is called or the handle is dropped
    pub async fn cancelled(&mut self) {
        loop {
            let cancelled = *self.rx.borrow_and_update();
            if cancelled {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

struct FrameReader<S> {
    body: S,
    framing: Framing,
    decoder: Utf8Decoder,
    buffer: String,
    ready: VecDeque<Frame>,
    done: bool,
}

/// Lazily decode and parse a chunked body.
///
/// The returned stream is forward-only and finite: it ends after the body
/// ends (once the decoder and framing buffers are flushed) or right after
/// yielding the first transport error.
pub fn frames<S, B, E>(body: S, framing: Framing) -> impl Stream<Item = Result<Frame, ChatError>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<ChatError>,
{
    let reader = FrameReader {
        body,
        framing,
        decoder: Utf8Decoder::new(),
        buffer: String::new(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(frame) = reader.ready.pop_front() {
                return Some((Ok(frame), reader));
            }
            if reader.done {
                return None;
            }

            match reader.body.next().await {
                Some(Ok(chunk)) => {
                    let bytes = chunk.as_ref();
                    let text = reader.decoder.decode(bytes);
                    tracing::debug!(bytes = bytes.len(), "received chunk: {}", text);
                    reader.buffer.push_str(&text);
                    let parsed = reader.framing.parse(&mut reader.buffer);
                    reader.ready.extend(parsed);
                }
                Some(Err(e)) => {
                    reader.done = true;
                    return Some((Err(e.into()), reader));
                }
                None => {
                    reader.done = true;
                    let tail = reader.decoder.finish();
                    reader.buffer.push_str(&tail);
                    let parsed = reader.framing.flush(&mut reader.buffer);
                    reader.ready.extend(parsed);
                }
            }
        }
    })
}

async fn with_idle_timeout<F: Future>(
    fut: F,
    idle_timeout: Option<Duration>,
) -> Result<F::Output, ChatError> {
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ChatError::IdleTimeout(limit)),
        None => Ok(fut.await),
    }
}

/// Feed every text frame to `sink` in arrival order.
///
/// Malformed frames are logged and skipped. The stream ends on end-of-data,
/// the first transport error, an idle gap longer than `idle_timeout`, or
/// cancellation.
pub async fn consume<S, F>(
    frames: S,
    idle_timeout: Option<Duration>,
    mut cancel: CancelToken,
    mut sink: F,
) -> StreamOutcome
where
    S: Stream<Item = Result<Frame, ChatError>>,
    F: FnMut(String),
{
    tokio::pin!(frames);
    let mut summary = StreamSummary::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("response stream cancelled after {} fragments", summary.fragments);
                return StreamOutcome::Cancelled;
            }
            next = with_idle_timeout(frames.next(), idle_timeout) => next,
        };

        match next {
            Ok(Some(Ok(Frame::Text(fragment)))) => {
                summary.fragments += 1;
                sink(fragment);
            }
            Ok(Some(Ok(Frame::Malformed(e)))) => {
                summary.malformed += 1;
                tracing::warn!("skipping malformed frame: {}", e);
            }
            Ok(Some(Err(e))) | Err(e) => {
                tracing::error!("response stream failed: {}", e);
                return StreamOutcome::Failed(e);
            }
            Ok(None) => {
                tracing::debug!(
                    fragments = summary.fragments,
                    malformed = summary.malformed,
                    "response stream complete"
                );
                return StreamOutcome::Completed(summary);
            }
        }
    }
}
