//! Conversion between `parley_core` types and the Anthropic wire format

use parley_core::{ChatCompleteRequest, ChatError, Message, MessagePart, Role, Tool, ToolCall, ToolResult};

use crate::protocol::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicTool};

/// Default max tokens when not specified (Anthropic requires this field)
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Per-completer settings that end up in every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSettings {
    /// Provider model identifier
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// Wire request plus data derived from it for observability
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Body sent to the messages endpoint
    pub body: AnthropicRequest,
    /// Declared tool names, sorted
    pub tool_names: Vec<String>,
}

// -- Outbound: internal types -> Anthropic wire format --

/// Build the streaming wire request for a chat completion
///
/// Pure; temperature is forwarded as-is and range policy is left to the caller.
///
/// # Errors
///
/// Returns `ChatError::InvalidRequest` if a message contains a part this
/// provider cannot represent or two tools share a name.
pub fn to_provider_request(
    req: &ChatCompleteRequest,
    settings: &RequestSettings,
) -> Result<ProviderRequest, ChatError> {
    let messages = req
        .messages
        .iter()
        .map(internal_message_to_anthropic)
        .collect::<Result<Vec<_>, _>>()?;

    let tools = if req.tools.is_empty() {
        None
    } else {
        Some(req.tools.iter().map(internal_tool_to_anthropic).collect())
    };

    let mut tool_names: Vec<String> = req.tools.iter().map(|t| t.name.clone()).collect();
    tool_names.sort();
    if let Some(pair) = tool_names.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(ChatError::invalid_request(format!("duplicate tool name: {}", pair[0])));
    }

    let body = AnthropicRequest {
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        system: req.system.clone(),
        messages,
        temperature: req.temperature.map(|t| t.value()),
        stream: Some(true),
        tools,
    };

    Ok(ProviderRequest { body, tool_names })
}

/// Convert an internal message to Anthropic wire format
fn internal_message_to_anthropic(msg: &Message) -> Result<AnthropicMessage, ChatError> {
    let role = match msg.role {
        Role::User => "user",
        Role::Model => "assistant",
    };

    let content = msg
        .parts
        .iter()
        .map(internal_part_to_anthropic)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnthropicMessage {
        role: role.to_owned(),
        content,
    })
}

/// Convert a single message part to an Anthropic content block
fn internal_part_to_anthropic(part: &MessagePart) -> Result<AnthropicContentBlock, ChatError> {
    match part {
        MessagePart::Text(text) => Ok(AnthropicContentBlock::Text { text: text.clone() }),
        MessagePart::ToolCall(call) => Ok(AnthropicContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.args.clone(),
        }),
        MessagePart::ToolResult(result) => {
            let (content, is_error) = match &result.err {
                Some(err) => (err.clone(), true),
                None => (result.content.clone(), false),
            };
            Ok(AnthropicContentBlock::ToolResult {
                tool_use_id: result.id.clone(),
                content,
                is_error,
            })
        }
        MessagePart::Data { .. } => Err(ChatError::invalid_request(format!(
            "unsupported part type: {}",
            part.kind()
        ))),
    }
}

/// Convert a tool definition to an Anthropic tool descriptor
fn internal_tool_to_anthropic(tool: &Tool) -> AnthropicTool {
    let mut input_schema = serde_json::json!({
        "type": "object",
        "properties": tool.schema.properties,
    });
    if !tool.schema.required.is_empty() {
        input_schema["required"] = serde_json::json!(tool.schema.required);
    }

    AnthropicTool {
        name: tool.name.clone(),
        description: Some(tool.description.clone()),
        input_schema,
    }
}

// -- Inbound: Anthropic wire format -> internal types --

impl TryFrom<&AnthropicMessage> for Message {
    type Error = ChatError;

    fn try_from(msg: &AnthropicMessage) -> Result<Self, Self::Error> {
        let role = match msg.role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Model,
            other => return Err(ChatError::invalid_request(format!("unknown role {other}"))),
        };

        let parts = msg
            .content
            .iter()
            .map(|block| match block {
                AnthropicContentBlock::Text { text } => MessagePart::Text(text.clone()),
                AnthropicContentBlock::ToolUse { id, name, input } => MessagePart::ToolCall(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    args: input.clone(),
                }),
                AnthropicContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => MessagePart::ToolResult(if *is_error {
                    ToolResult::error(tool_use_id.clone(), content)
                } else {
                    ToolResult::ok(tool_use_id.clone(), content.clone())
                }),
            })
            .collect();

        Ok(Self { role, parts })
    }
}
