use async_trait::async_trait;

use crate::error::ChatError;
use crate::response::ChatCompleteResponse;
use crate::types::ChatCompleteRequest;

/// Trait implemented by each chat completion backend
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Start a chat completion
    ///
    /// Contract violations in the request fail here, before anything is sent.
    /// Everything that goes wrong later arrives as the final item of the
    /// returned response.
    async fn chat_complete(&self, request: ChatCompleteRequest) -> Result<ChatCompleteResponse, ChatError>;
}
