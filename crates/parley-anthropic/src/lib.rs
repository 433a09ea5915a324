//! Anthropic Messages API adapter for Parley
//!
//! Maps [`parley_core`] conversations onto the streaming Messages API and turns
//! the server-sent events back into [`parley_core::MessagePart`]s. Production is
//! lazy: no request is sent until the response stream is first polled, and the
//! provider connection is released exactly once however the stream ends.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod accumulate;
pub mod client;
pub mod completer;
pub mod convert;
pub mod model;
pub mod normalize;
pub mod protocol;
pub mod transport;

pub use client::{AnthropicClient, ClientOptions};
pub use completer::{AnthropicChatCompleter, ChatCompleterOptions};
pub use convert::{DEFAULT_MAX_TOKENS, ProviderRequest, RequestSettings, to_provider_request};
pub use model::ChatCompleteModel;
pub use parley_config::LastMessageRole;
pub use transport::{DEFAULT_BASE_URL, EventStream, HttpTransport, Transport};
