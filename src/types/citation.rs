//! Source citations surfaced next to an answer.

use serde::{Deserialize, Serialize};

/// Where a piece of retrieved content came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceCitation {
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl SourceCitation {
    pub fn new(text: impl Into<String>, link: Option<String>) -> Self {
        Self {
            text: text.into(),
            link,
        }
    }
}

impl std::fmt::Display for SourceCitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.link {
            Some(link) => write!(f, "{} <{}>", self.text, link),
            None => f.write_str(&self.text),
        }
    }
}
