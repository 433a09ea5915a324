use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human or calling application
    User,
    /// The language model
    #[serde(alias = "assistant")]
    Model,
}

impl Role {
    /// Lowercase name as used in logs and serialized messages
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Ordered content parts
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// Create a message from the given role and parts
    pub const fn new(role: Role, parts: Vec<MessagePart>) -> Self {
        Self { role, parts }
    }

    /// User message with a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![MessagePart::Text(text.into())])
    }

    /// Model message with a single text part
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![MessagePart::Text(text.into())])
    }

    /// User message carrying the result of a tool call
    pub fn user_tool_result(result: ToolResult) -> Self {
        Self::new(Role::User, vec![MessagePart::ToolResult(result)])
    }
}

/// Individual part within a message
///
/// Exactly one variant is active per part. Not every provider supports every
/// variant; adapters reject unsupported ones before sending anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessagePart {
    /// Text content
    Text(String),
    /// Tool invocation requested by the model
    ToolCall(ToolCall),
    /// Result of a tool invocation, sent back by the caller
    ToolResult(ToolResult),
    /// Binary attachment
    Data {
        /// MIME type of the payload (e.g. "image/png")
        mime_type: String,
        /// Raw payload bytes
        data: Vec<u8>,
    },
}

impl MessagePart {
    /// Short name of the active variant
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::ToolCall(_) => "tool_call",
            Self::ToolResult(_) => "tool_result",
            Self::Data { .. } => "data",
        }
    }

    /// Text content, if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Tool call, if this is a tool call part
    pub const fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::ToolCall(call) => Some(call),
            _ => None,
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned identifier, echoed back in the matching result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Structured arguments
    pub args: serde_json::Value,
}

/// Result of a tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result responds to
    pub id: String,
    /// Output content from the tool
    pub content: String,
    /// Error message when the tool failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl ToolResult {
    /// Successful result
    pub fn ok(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            err: None,
        }
    }

    /// Failed result
    pub fn error(id: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            err: Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_is_an_alias_for_model() {
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Model);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = serde_json::from_value::<Message>(serde_json::json!({
            "role": "system",
            "parts": [{"type": "text", "value": "hi"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn tool_result_error_carries_message() {
        let result = ToolResult::error("toolu_1", "file not found");
        assert_eq!(result.err.as_deref(), Some("file not found"));
        assert!(result.content.is_empty());
    }
}
