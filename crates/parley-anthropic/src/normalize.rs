//! Translation of provider events into normalized message parts

use std::collections::HashSet;

use parley_core::{ChatError, MessagePart, Tool, ToolCall};

use crate::accumulate::{AccumulatedBlock, AccumulatedMessage};
use crate::protocol::{AnthropicStreamDelta, AnthropicStreamEvent};

/// Per-response state turning provider events into [`MessagePart`]s
///
/// Text is emitted as soon as it arrives. Tool calls are emitted only once
/// their block closes and their name has been checked against the tools
/// declared in the request. An `Err` item is always the last one produced
/// for an event, and callers must stop feeding events after it.
#[derive(Debug)]
pub struct Normalizer {
    tool_names: HashSet<String>,
    message: AccumulatedMessage,
}

impl Normalizer {
    /// Create a normalizer accepting calls to the given tools
    pub fn new<'a>(tools: impl IntoIterator<Item = &'a Tool>) -> Self {
        Self {
            tool_names: tools.into_iter().map(|t| t.name.clone()).collect(),
            message: AccumulatedMessage::new(),
        }
    }

    /// Accumulated message state
    pub const fn message(&self) -> &AccumulatedMessage {
        &self.message
    }

    /// Process one provider event
    pub fn on_event(&mut self, event: &AnthropicStreamEvent) -> Vec<Result<MessagePart, ChatError>> {
        if let Err(err) = self.message.accumulate(event) {
            if err.is_benign() {
                tracing::debug!(error = %err, "ignoring empty tool input");
            } else {
                return vec![Err(ChatError::Accumulation(err.to_string()))];
            }
        }

        match event {
            AnthropicStreamEvent::ContentBlockDelta { delta, .. } => match delta {
                AnthropicStreamDelta::TextDelta { text } => vec![Ok(MessagePart::Text(text.clone()))],
                AnthropicStreamDelta::InputJsonDelta { .. } | AnthropicStreamDelta::Other => Vec::new(),
            },

            AnthropicStreamEvent::ContentBlockStop { .. } => {
                let parts = self.completed_tool_calls();
                self.message.reset_content();
                parts
            }

            AnthropicStreamEvent::MessageStart { .. }
            | AnthropicStreamEvent::ContentBlockStart { .. }
            | AnthropicStreamEvent::MessageDelta { .. }
            | AnthropicStreamEvent::MessageStop
            | AnthropicStreamEvent::Ping
            | AnthropicStreamEvent::Error { .. }
            | AnthropicStreamEvent::Unknown => Vec::new(),
        }
    }

    /// Tool calls among the accumulated blocks; text was already streamed
    fn completed_tool_calls(&self) -> Vec<Result<MessagePart, ChatError>> {
        let mut parts = Vec::new();

        for block in self.message.content() {
            let AccumulatedBlock::ToolUse { id, name, input, .. } = block else {
                continue;
            };

            tracing::debug!(id = %id, name = %name, input = %input, "tool call");

            if !self.tool_names.contains(name) {
                parts.push(Err(ChatError::ToolNotFound { name: name.clone() }));
                break;
            }

            parts.push(Ok(MessagePart::ToolCall(ToolCall {
                id: id.clone(),
                name: name.clone(),
                args: input.clone(),
            })));
        }

        parts
    }
}

#[cfg(test)]
mod tests {
    use parley_core::ToolSchema;
    use serde_json::json;

    use super::*;

    fn events(raw: &[serde_json::Value]) -> Vec<AnthropicStreamEvent> {
        raw.iter().map(|v| serde_json::from_value(v.clone()).unwrap()).collect()
    }

    fn run(normalizer: &mut Normalizer, events: &[AnthropicStreamEvent]) -> Vec<Result<MessagePart, ChatError>> {
        events.iter().flat_map(|e| normalizer.on_event(e)).collect()
    }

    fn read_file() -> Tool {
        Tool::new("read_file", "Read a file.", ToolSchema::empty())
    }

    fn tool_transcript(name: &str) -> Vec<AnthropicStreamEvent> {
        events(&[
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Let me look."}}),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_01", "name": name, "input": {}}}),
            json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"path\": \"readme.txt\"}"}}),
            json!({"type": "content_block_stop", "index": 1}),
            json!({"type": "message_stop"}),
        ])
    }

    #[test]
    fn text_is_streamed_and_not_repeated_on_stop() {
        let mut normalizer = Normalizer::new(std::iter::empty());
        let parts = run(
            &mut normalizer,
            &events(&[
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hello"}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "!"}}),
                json!({"type": "content_block_stop", "index": 0}),
            ]),
        );

        assert_eq!(
            parts,
            vec![
                Ok(MessagePart::Text("Hello".to_owned())),
                Ok(MessagePart::Text("!".to_owned())),
            ]
        );
    }

    #[test]
    fn tool_call_follows_text_after_block_stop() {
        let tools = [read_file()];
        let mut normalizer = Normalizer::new(&tools);
        let transcript = tool_transcript("read_file");

        // Nothing for the tool block until it closes
        assert_eq!(run(&mut normalizer, &transcript[..5]).len(), 1);
        let on_stop = normalizer.on_event(&transcript[5]);

        assert_eq!(
            on_stop,
            vec![Ok(MessagePart::ToolCall(ToolCall {
                id: "toolu_01".to_owned(),
                name: "read_file".to_owned(),
                args: json!({"path": "readme.txt"}),
            }))]
        );
    }

    #[test]
    fn undeclared_tool_is_an_error() {
        let tools = [read_file()];
        let mut normalizer = Normalizer::new(&tools);
        let parts = run(&mut normalizer, &tool_transcript("delete_everything"));

        assert_eq!(
            parts.last(),
            Some(&Err(ChatError::ToolNotFound {
                name: "delete_everything".to_owned()
            }))
        );
    }

    #[test]
    fn tool_without_input_gets_start_value() {
        let tools = [read_file()];
        let mut normalizer = Normalizer::new(&tools);
        let parts = run(
            &mut normalizer,
            &events(&[
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_02", "name": "read_file", "input": {}}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": ""}}),
                json!({"type": "content_block_stop", "index": 0}),
            ]),
        );

        assert_eq!(
            parts,
            vec![Ok(MessagePart::ToolCall(ToolCall {
                id: "toolu_02".to_owned(),
                name: "read_file".to_owned(),
                args: json!({}),
            }))]
        );
    }

    #[test]
    fn input_cut_by_max_tokens_is_an_error() {
        let tools = [read_file()];
        let mut normalizer = Normalizer::new(&tools);
        let parts = run(
            &mut normalizer,
            &events(&[
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_02", "name": "read_file", "input": {}}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "{\"path\": \"/etc/pass"}}),
                json!({"type": "content_block_stop", "index": 0}),
                json!({"type": "message_delta", "delta": {"stop_reason": "max_tokens", "stop_sequence": null}, "usage": {"output_tokens": 64}}),
                json!({"type": "message_stop"}),
            ]),
        );

        assert_eq!(parts.len(), 1, "{parts:?}");
        let Err(ChatError::Accumulation(message)) = &parts[0] else {
            panic!("expected accumulation error, got {parts:?}");
        };
        assert!(message.starts_with("truncated tool input"), "{message}");
        assert_eq!(normalizer.message().stop_reason(), Some("max_tokens"));
    }

    #[test]
    fn second_start_while_open_is_an_error() {
        let mut normalizer = Normalizer::new(std::iter::empty());
        let parts = run(
            &mut normalizer,
            &events(&[
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
                json!({"type": "content_block_start", "index": 1, "content_block": {"type": "text", "text": ""}}),
                json!({"type": "content_block_delta", "index": 1, "delta": {"type": "text_delta", "text": "x"}}),
            ]),
        );

        assert!(parts.iter().all(Result::is_err), "{parts:?}");
        assert_eq!(
            parts.first(),
            Some(&Err(ChatError::Accumulation(
                "received content_block_start for block 1 while block 0 is open".to_owned()
            )))
        );
    }

    #[test]
    fn accumulation_failure_is_reported() {
        let mut normalizer = Normalizer::new(std::iter::empty());
        let parts = normalizer.on_event(&AnthropicStreamEvent::ContentBlockStop { index: 0 });

        assert_eq!(
            parts,
            vec![Err(ChatError::Accumulation(
                "received content_block_stop but there was no open content block".to_owned()
            ))]
        );
    }

    #[test]
    fn non_text_deltas_yield_nothing() {
        let mut normalizer = Normalizer::new(std::iter::empty());
        let parts = run(
            &mut normalizer,
            &events(&[
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "thinking", "thinking": ""}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "thinking_delta", "thinking": "Hmm"}}),
                json!({"type": "content_block_stop", "index": 0}),
                json!({"type": "ping"}),
            ]),
        );

        assert!(parts.is_empty());
    }
}
