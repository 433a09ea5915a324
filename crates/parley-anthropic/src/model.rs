//! Model identifiers

use std::fmt;
use std::str::FromStr;

/// Anthropic model used for chat completion
///
/// Named variants cover the models this crate is tested against; anything
/// else the provider accepts can be passed through as [`ChatCompleteModel::Custom`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ChatCompleteModel {
    /// Claude 3.5 Haiku, latest snapshot
    #[default]
    Claude3_5HaikuLatest,
    /// Claude 3.7 Sonnet, latest snapshot
    Claude3_7SonnetLatest,
    /// Claude 4 Opus (2025-05-14)
    Claude4OpusLatest,
    /// Claude 4 Sonnet (2025-05-14)
    Claude4SonnetLatest,
    /// Any other provider model identifier
    Custom(String),
}

/// Wire identifiers of the named models
const KNOWN_MODELS: [(ChatCompleteModel, &str); 4] = [
    (ChatCompleteModel::Claude3_5HaikuLatest, "claude-3-5-haiku-latest"),
    (ChatCompleteModel::Claude3_7SonnetLatest, "claude-3-7-sonnet-latest"),
    (ChatCompleteModel::Claude4OpusLatest, "claude-opus-4-20250514"),
    (ChatCompleteModel::Claude4SonnetLatest, "claude-sonnet-4-20250514"),
];

impl ChatCompleteModel {
    /// Identifier sent to the provider
    pub fn wire_id(&self) -> &str {
        if let Self::Custom(id) = self {
            return id;
        }

        KNOWN_MODELS
            .iter()
            .find_map(|(model, id)| (model == self).then_some(*id))
            .unwrap_or_default()
    }

    /// All named models
    pub fn known() -> impl Iterator<Item = Self> {
        KNOWN_MODELS.into_iter().map(|(model, _)| model)
    }
}

impl FromStr for ChatCompleteModel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let model = KNOWN_MODELS
            .into_iter()
            .find_map(|(model, id)| (id == s).then_some(model))
            .unwrap_or_else(|| Self::Custom(s.to_owned()));

        Ok(model)
    }
}

impl fmt::Display for ChatCompleteModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_id())
    }
}
