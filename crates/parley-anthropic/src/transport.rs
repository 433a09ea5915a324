//! Streaming transport to the Anthropic Messages API

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use parley_core::ChatError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::protocol::{AnthropicErrorResponse, AnthropicRequest, AnthropicStreamEvent};

/// Default Anthropic API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Stream of decoded provider events that must be closed when done
pub trait EventStream: Stream<Item = Result<AnthropicStreamEvent, ChatError>> + Send + Unpin {
    /// Release the underlying connection
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ResourceRelease` if the stream cannot be released,
    /// including when it was already closed.
    fn close(&mut self) -> Result<(), ChatError>;
}

/// Opens provider event streams
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a streaming request and return its event stream
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Transport` if the request cannot be sent or the
    /// provider rejects it.
    async fn open(&self, request: &AnthropicRequest) -> Result<Box<dyn EventStream>, ChatError>;
}

/// HTTP transport using server-sent events
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl HttpTransport {
    /// Create a transport for the given key and optional base URL override
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidRequest` if the default base URL cannot be
    /// parsed.
    pub fn new(api_key: SecretString, base_url: Option<Url>) -> Result<Self, ChatError> {
        let base_url = match base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| ChatError::invalid_request(format!("invalid base URL: {e}")))?,
        };

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key,
        })
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/messages")
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &AnthropicRequest) -> Result<Box<dyn EventStream>, ChatError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("x-api-key", self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "upstream stream request failed");
                ChatError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "upstream returned error");
            let message = serde_json::from_str::<AnthropicErrorResponse>(&body)
                .map_or(body, |e| format!("{}: {}", e.error.error_type, e.error.message));
            return Err(ChatError::Transport(format!("provider returned {status}: {message}")));
        }

        let events = response.bytes_stream().eventsource().filter_map(|result| {
            let event = match result {
                Ok(event) => decode_event(&event.data),
                Err(e) => Some(Err(ChatError::Transport(e.to_string()))),
            };

            async move { event }
        });

        Ok(Box::new(HttpEventStream {
            inner: Some(Box::pin(events)),
        }))
    }
}

/// Decode one SSE `data` payload
///
/// Empty payloads are skipped. In-band `error` events become transport errors.
fn decode_event(data: &str) -> Option<Result<AnthropicStreamEvent, ChatError>> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }

    let event = match serde_json::from_str::<AnthropicStreamEvent>(data) {
        Ok(AnthropicStreamEvent::Error { error }) => Err(ChatError::Transport(format!(
            "{}: {}",
            error.error_type, error.message
        ))),
        Ok(event) => Ok(event),
        Err(e) => Err(ChatError::Transport(format!("invalid stream event: {e}"))),
    };

    Some(event)
}

type BoxedEvents = Pin<Box<dyn Stream<Item = Result<AnthropicStreamEvent, ChatError>> + Send>>;

/// Event stream backed by an HTTP response body
struct HttpEventStream {
    inner: Option<BoxedEvents>,
}

impl Stream for HttpEventStream {
    type Item = Result<AnthropicStreamEvent, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut() {
            Some(inner) => inner.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

impl EventStream for HttpEventStream {
    fn close(&mut self) -> Result<(), ChatError> {
        match self.inner.take() {
            // Dropping the body stream closes the connection
            Some(inner) => {
                drop(inner);
                Ok(())
            }
            None => Err(ChatError::ResourceRelease("stream already closed".to_owned())),
        }
    }
}
