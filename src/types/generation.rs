//! Generation settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Settings controlling a single generator call.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct GenerationSettings {
    #[builder(default = 800)]
    pub max_tokens: u32,
    #[builder(default = 0.0)]
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            temperature: 0.0,
            top_p: None,
            stop_sequences: None,
        }
    }
}

/// How the generator may pick tools when a schema set is attached.
///
/// The engine only ever lets the generator decide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
}

/// Why the generator stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    Other,
}

impl StopReason {
    /// Whether the generator is asking for tools to be run.
    pub fn wants_tools(self) -> bool {
        matches!(self, Self::ToolUse)
    }

    /// Map a wire stop reason, treating anything unrecognised as `Other`.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("end_turn") => Self::EndTurn,
            Some("tool_use") => Self::ToolUse,
            Some("max_tokens") => Self::MaxTokens,
            Some("stop_sequence") => Self::StopSequence,
            _ => Self::Other,
        }
    }
}
