use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

use crate::error::ChatError;
use crate::types::MessagePart;

/// Boxed stream of normalized message parts
pub type PartStream = Pin<Box<dyn Stream<Item = Result<MessagePart, ChatError>> + Send>>;

/// Lazily produced reply to a chat completion request
///
/// Single-pass and finite. Nothing is fetched until the first part is
/// polled, and an error item is always the last item. Dropping the response
/// early stops production and releases the underlying provider stream.
pub struct ChatCompleteResponse {
    parts: PartStream,
}

impl ChatCompleteResponse {
    /// Wrap a part stream
    pub fn new<S>(parts: S) -> Self
    where
        S: Stream<Item = Result<MessagePart, ChatError>> + Send + 'static,
    {
        Self { parts: Box::pin(parts) }
    }
}

impl Stream for ChatCompleteResponse {
    type Item = Result<MessagePart, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.parts.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ChatCompleteResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompleteResponse").finish_non_exhaustive()
    }
}
