//! Chat completer backed by the Anthropic Messages API

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use parley_config::{AnthropicConfig, LastMessageRole};
use parley_core::{ChatCompleteRequest, ChatCompleteResponse, ChatCompleter, ChatError, MessagePart, Role};
use tracing::{Instrument, Span, field};

use crate::convert::{DEFAULT_MAX_TOKENS, RequestSettings, to_provider_request};
use crate::model::ChatCompleteModel;
use crate::normalize::Normalizer;
use crate::protocol::{AnthropicRequest, AnthropicStreamEvent};
use crate::transport::{EventStream, Transport};

/// Settings fixed for every request a completer sends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatCompleterOptions {
    /// Model to complete with
    pub model: ChatCompleteModel,
    /// Maximum tokens to generate, defaults to [`DEFAULT_MAX_TOKENS`]
    pub max_tokens: Option<u32>,
    /// Constraint on the role of the final message
    pub last_message_role: LastMessageRole,
}

impl ChatCompleterOptions {
    /// Options from the `[anthropic]` config section
    pub fn from_config(config: &AnthropicConfig) -> Self {
        Self {
            model: config.model.parse().unwrap_or_default(),
            max_tokens: config.max_tokens,
            last_message_role: config.last_message_role,
        }
    }
}

/// Anthropic implementation of [`ChatCompleter`]
pub struct AnthropicChatCompleter {
    transport: Arc<dyn Transport>,
    settings: RequestSettings,
    last_message_role: LastMessageRole,
}

impl AnthropicChatCompleter {
    /// Create a completer sending requests through the given transport
    pub fn with_transport(transport: Arc<dyn Transport>, options: ChatCompleterOptions) -> Self {
        Self {
            transport,
            settings: RequestSettings {
                model: options.model.wire_id().to_owned(),
                max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            },
            last_message_role: options.last_message_role,
        }
    }

    fn validate(&self, request: &ChatCompleteRequest) -> Result<(), ChatError> {
        let Some(last) = request.messages.last() else {
            return Err(ChatError::invalid_request("no messages"));
        };

        if self.last_message_role == LastMessageRole::RequireUser && last.role != Role::User {
            return Err(ChatError::invalid_request(format!(
                "last message must have role user, got {}",
                last.role.as_str()
            )));
        }

        if let Some(temperature) = request.temperature {
            let value = temperature.value();
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChatError::invalid_request(format!(
                    "temperature must be between 0 and 1, got {value}"
                )));
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for AnthropicChatCompleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicChatCompleter")
            .field("settings", &self.settings)
            .field("last_message_role", &self.last_message_role)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatCompleter for AnthropicChatCompleter {
    async fn chat_complete(&self, request: ChatCompleteRequest) -> Result<ChatCompleteResponse, ChatError> {
        if let Err(err) = self.validate(&request) {
            tracing::debug!(error = %err, "rejecting chat completion request");
            return Err(err);
        }

        let provider = to_provider_request(&request, &self.settings)?;
        let tools = provider.tool_names.join(",");

        let span = tracing::info_span!(
            "anthropic.chat_complete",
            ai.model = %self.settings.model,
            ai.message_count = request.messages.len(),
            ai.tool_count = request.tools.len(),
            ai.tools = %tools,
            ai.temperature = field::Empty,
            ai.has_system_prompt = request.system.is_some(),
            ai.system_prompt = field::Empty,
            ai.input_tokens = field::Empty,
            ai.output_tokens = field::Empty,
            error = field::Empty,
            error.type = field::Empty,
        );
        if let Some(temperature) = request.temperature {
            span.record("ai.temperature", temperature.value());
        }
        // Prompt text can be sensitive, only record it when debugging
        if let Some(system) = &request.system
            && tracing::enabled!(tracing::Level::DEBUG)
        {
            span.record("ai.system_prompt", system.as_str());
        }

        let normalizer = Normalizer::new(&request.tools);
        let parts = produce(Arc::clone(&self.transport), provider.body, normalizer, span);

        Ok(ChatCompleteResponse::new(parts))
    }
}

/// Lazily drive one provider stream through the normalizer
///
/// Nothing happens until the first poll. Production ends after the first
/// error, and the provider stream is closed exactly once however it ends.
fn produce(
    transport: Arc<dyn Transport>,
    body: AnthropicRequest,
    mut normalizer: Normalizer,
    span: Span,
) -> impl Stream<Item = Result<MessagePart, ChatError>> + Send + 'static {
    async_stream::stream! {
        let opened = transport.open(&body).instrument(span.clone()).await;

        let mut guard = match opened {
            Ok(stream) => Some(StreamGuard::new(stream)),
            Err(err) => {
                record_error(&span, &err);
                yield Err(err);
                None
            }
        };

        if let Some(guard) = guard.as_mut() {
            'events: while let Some(event) = guard.next().await {
                let items = match event {
                    Ok(event) => span.in_scope(|| normalizer.on_event(&event)),
                    Err(err) => vec![Err(err)],
                };

                for item in items {
                    let failed = match &item {
                        Ok(_) => false,
                        Err(err) => {
                            record_error(&span, err);
                            true
                        }
                    };

                    yield item;

                    if failed {
                        break 'events;
                    }
                }
            }

            guard.release();
        }

        let message = normalizer.message();
        let usage = message.usage();
        span.record("ai.input_tokens", usage.input_tokens);
        span.record("ai.output_tokens", usage.output_tokens);
        span.in_scope(|| {
            tracing::debug!(
                id = message.id().unwrap_or_default(),
                model = message.model().unwrap_or_default(),
                stop_reason = message.stop_reason().unwrap_or_default(),
                "response finished"
            );
        });
    }
}

fn record_error(span: &Span, err: &ChatError) {
    span.record("error", field::display(err));
    span.record("error.type", err.error_type());
}

/// Owns an open provider stream and closes it once
///
/// Closing happens on [`StreamGuard::release`] or, when the consumer stops
/// pulling early, on drop.
struct StreamGuard {
    stream: Option<Box<dyn EventStream>>,
}

impl StreamGuard {
    fn new(stream: Box<dyn EventStream>) -> Self {
        Self { stream: Some(stream) }
    }

    async fn next(&mut self) -> Option<Result<AnthropicStreamEvent, ChatError>> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take()
            && let Err(err) = stream.close()
        {
            tracing::warn!(error = %err, "error closing stream");
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}
