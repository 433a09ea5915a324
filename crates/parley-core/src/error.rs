use thiserror::Error;

/// Errors that can occur while completing a chat
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// Caller broke the request contract; detected before any network call
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider events could not be folded into a coherent message
    #[error("error accumulating message: {0}")]
    Accumulation(String),

    /// Model asked for a tool that was not declared in the request
    #[error("tool not found: `{name}`")]
    ToolNotFound {
        /// Name the model used
        name: String,
    },

    /// Provider stream or connection failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Releasing the provider stream failed
    #[error("failed to release stream: {0}")]
    ResourceRelease(String),
}

impl ChatError {
    /// Shorthand for [`ChatError::InvalidRequest`]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Machine-readable error type (e.g. `invalid_request_error`)
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Accumulation(_) => "accumulation_error",
            Self::ToolNotFound { .. } => "tool_not_found_error",
            Self::Transport(_) => "transport_error",
            Self::ResourceRelease(_) => "resource_release_error",
        }
    }
}
