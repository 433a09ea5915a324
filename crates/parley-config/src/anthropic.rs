use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Anthropic provider configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: SecretString,
    /// Override for the API base URL
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens to generate per response
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Constraint on the role of the final message of a conversation
    #[serde(default)]
    pub last_message_role: LastMessageRole,
}

/// Which role the final message of a conversation may have
///
/// Early revisions of the Messages API required conversations to end with a
/// user turn. Later revisions accept a trailing assistant turn as a prefill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastMessageRole {
    /// The last message must come from the user
    RequireUser,
    /// Any role is accepted
    #[default]
    Unconstrained,
}

fn default_model() -> String {
    "claude-3-5-haiku-latest".to_owned()
}
