//! Anthropic model identifiers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Anthropic models the assistant is known to work with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
pub enum AnthropicModel {
    #[strum(serialize = "claude-opus-4-5-20251101")]
    ClaudeOpus45,
    #[strum(serialize = "claude-sonnet-4-5-20250929")]
    ClaudeSonnet45,
    #[strum(serialize = "claude-sonnet-4-20250514")]
    ClaudeSonnet4,
    #[strum(serialize = "claude-3-5-haiku-20241022")]
    ClaudeHaiku35,
    /// Any other model ID, passed through verbatim.
    #[strum(default)]
    Custom(String),
}

impl AnthropicModel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ClaudeOpus45 => "claude-opus-4-5-20251101",
            Self::ClaudeSonnet45 => "claude-sonnet-4-5-20250929",
            Self::ClaudeSonnet4 => "claude-sonnet-4-20250514",
            Self::ClaudeHaiku35 => "claude-3-5-haiku-20241022",
            Self::Custom(s) => s,
        }
    }
}

impl Default for AnthropicModel {
    fn default() -> Self {
        Self::ClaudeSonnet4
    }
}
