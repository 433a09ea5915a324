//! Provider-agnostic conversation, tool and request types

pub mod message;
pub mod request;
pub mod tool;

pub use message::{Message, MessagePart, Role, ToolCall, ToolResult};
pub use request::{ChatCompleteRequest, Temperature};
pub use tool::{Tool, ToolSchema};
