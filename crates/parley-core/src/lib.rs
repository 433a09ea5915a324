//! Provider-agnostic chat completion model for Parley
//!
//! Defines the conversation, tool and request types shared by every provider
//! adapter, the lazily pulled [`ChatCompleteResponse`], and the
//! [`ChatCompleter`] trait adapters implement.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod completer;
pub mod error;
pub mod response;
pub mod types;

pub use completer::ChatCompleter;
pub use error::ChatError;
pub use response::{ChatCompleteResponse, PartStream};
pub use types::{ChatCompleteRequest, Message, MessagePart, Role, Temperature, Tool, ToolCall, ToolResult, ToolSchema};
