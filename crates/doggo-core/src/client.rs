use crate::error::ChatError;
use crate::framing::{Frame, Framing};
use crate::stream::{self, CancelToken, StreamOutcome};
use crate::submit::ChatRequest;
use futures_util::Stream;
use reqwest::Client;
use std::time::Duration;

/// HTTP client for the translation chat endpoint
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    framing: Framing,
    idle_timeout: Option<Duration>,
}

impl ChatClient {
    pub fn new(endpoint: &str, framing: Framing) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            framing,
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// POST the message and direction as form fields and return the parsed
    /// frames of the streamed reply
    pub async fn open(
        &self,
        request: &ChatRequest,
    ) -> Result<impl Stream<Item = Result<Frame, ChatError>>, ChatError> {
        tracing::info!(
            endpoint = %self.endpoint,
            direction = request.direction.as_str(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("message", request.message.as_str()),
                ("direction", request.direction.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status().as_u16()));
        }

        Ok(stream::frames(response.bytes_stream(), self.framing))
    }

    /// Send `request` and stream the reply into `sink` until it ends.
    ///
    /// Cancellation and the idle timeout cover the initial request as well as
    /// the body, so a stalled connect can't leave the caller waiting forever.
    pub async fn stream_reply<F>(
        &self,
        request: &ChatRequest,
        mut cancel: CancelToken,
        sink: F,
    ) -> StreamOutcome
    where
        F: FnMut(String),
    {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamOutcome::Cancelled,
            opened = self.open_with_timeout(request) => opened,
        };

        match opened {
            Ok(frames) => stream::consume(frames, self.idle_timeout, cancel, sink).await,
            Err(e) => {
                tracing::error!("chat request failed: {}", e);
                StreamOutcome::Failed(e)
            }
        }
    }

    async fn open_with_timeout(
        &self,
        request: &ChatRequest,
    ) -> Result<impl Stream<Item = Result<Frame, ChatError>>, ChatError> {
        match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.open(request))
                .await
                .map_err(|_| ChatError::IdleTimeout(limit))?,
            None => self.open(request).await,
        }
    }
}
