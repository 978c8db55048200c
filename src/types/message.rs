//! Message types for the conversation log.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A message in the conversation log.
///
/// System instructions never appear here; they travel alongside the log
/// in [`crate::provider::GeneratorRequest::system`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a plain-text user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Create an assistant message carrying the blocks a generator returned.
    pub fn assistant_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Create the user message that answers a batch of tool invocations.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
        }
    }

    /// Concatenate all text blocks.
    pub fn text(&self) -> String {
        collect_text(&self.content)
    }

    /// Tool invocations in this message, in block order.
    pub fn tool_invocations(&self) -> Vec<&ToolInvocation> {
        collect_invocations(&self.content)
    }

    /// Tool results in this message, in block order.
    pub fn tool_result_blocks(&self) -> Vec<&ToolResult> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult(result) => Some(result),
                _ => None,
            })
            .collect()
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single block of message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolInvocation),
    ToolResult(ToolResult),
}

/// A tool call requested by the generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// The outcome of one tool invocation, fed back to the generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

pub(crate) fn collect_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

pub(crate) fn collect_invocations(blocks: &[ContentBlock]) -> Vec<&ToolInvocation> {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse(invocation) => Some(invocation),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_blocks_use_wire_tags() {
        let block = ContentBlock::ToolUse(ToolInvocation {
            id: "toolu_1".into(),
            name: "search_course_content".into(),
            input: json!({"query": "computer use"}),
        });

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["name"], "search_course_content");

        let result = ContentBlock::ToolResult(ToolResult::success("toolu_1", "ok"));
        assert_eq!(serde_json::to_value(&result).unwrap()["type"], "tool_result");
    }

    #[test]
    fn text_skips_tool_blocks() {
        let message = Message::assistant_blocks(vec![
            ContentBlock::Text {
                text: "Let me look".into(),
            },
            ContentBlock::ToolUse(ToolInvocation {
                id: "a".into(),
                name: "t".into(),
                input: json!({}),
            }),
            ContentBlock::Text { text: " that up".into() },
        ]);

        assert_eq!(message.text(), "Let me look that up");
        assert_eq!(message.tool_invocations().len(), 1);
    }

    #[test]
    fn tool_results_message_is_user_role_in_order() {
        let message = Message::tool_results(vec![
            ToolResult::success("a", "first"),
            ToolResult::failure("b", "second"),
        ]);

        assert_eq!(message.role, Role::User);
        let ids: Vec<_> = message
            .tool_result_blocks()
            .iter()
            .map(|r| r.tool_use_id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(message.tool_result_blocks()[1].is_error);
    }
}
