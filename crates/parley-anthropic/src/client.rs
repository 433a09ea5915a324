//! Entry point for building Anthropic chat completers

use std::sync::Arc;

use parley_config::AnthropicConfig;
use parley_core::ChatError;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::completer::{AnthropicChatCompleter, ChatCompleterOptions};
use crate::transport::{HttpTransport, Transport};

/// Connection settings shared by every completer of a client
#[derive(Debug)]
pub struct ClientOptions {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Override for the API base URL
    pub base_url: Option<Url>,
}

/// Anthropic API client
///
/// Completers created from one client share its HTTP connection pool.
#[derive(Clone)]
pub struct AnthropicClient {
    transport: Arc<dyn Transport>,
}

impl AnthropicClient {
    /// Create a client talking to the Anthropic API over HTTP
    pub fn new(options: ClientOptions) -> Result<Self, ChatError> {
        let transport = HttpTransport::new(options.api_key, options.base_url)?;
        tracing::debug!(transport = ?transport, "created anthropic client");

        Ok(Self {
            transport: Arc::new(transport),
        })
    }

    /// Create a client from the `[anthropic]` config section
    pub fn from_config(config: &AnthropicConfig) -> Result<Self, ChatError> {
        Self::new(ClientOptions {
            api_key: SecretString::from(config.api_key.expose_secret()),
            base_url: config.base_url.clone(),
        })
    }

    /// Create a completer for one model
    pub fn chat_completer(&self, options: ChatCompleterOptions) -> AnthropicChatCompleter {
        AnthropicChatCompleter::with_transport(Arc::clone(&self.transport), options)
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient").finish_non_exhaustive()
    }
}
