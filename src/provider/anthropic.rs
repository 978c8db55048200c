//! Anthropic Messages API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SyllabusError;
use crate::models::AnthropicModel;
use crate::tools::ToolSchema;
use crate::types::*;

use super::http::{anthropic_headers, shared_client, status_to_error};
use super::{GeneratorBackend, GeneratorRequest, GeneratorResponse};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicGenerator {
    model: AnthropicModel,
    api_key: String,
    base_url: String,
}

impl AnthropicGenerator {
    pub fn new(model: AnthropicModel, api_key: String, base_url: Option<String>) -> Self {
        Self {
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            api_key,
        }
    }

    fn build_request_body<'a>(&'a self, request: &'a GeneratorRequest) -> MessagesBody<'a> {
        // The API rejects empty text blocks. Every message is kept so the
        // user/assistant alternation of the log survives.
        let messages = request
            .messages
            .iter()
            .map(|msg| WireMessage {
                role: msg.role,
                content: msg
                    .content
                    .iter()
                    .filter(|block| !matches!(block, ContentBlock::Text { text } if text.is_empty()))
                    .collect(),
            })
            .collect();

        let tools = request.tools.as_deref().filter(|tools| !tools.is_empty());
        MessagesBody {
            model: self.model.as_str(),
            max_tokens: request.settings.max_tokens,
            temperature: request.settings.temperature,
            top_p: request.settings.top_p,
            stop_sequences: request.settings.stop_sequences.as_deref(),
            system: (!request.system.is_empty()).then_some(request.system.as_str()),
            messages,
            tool_choice: tools.and(request.tool_choice.as_ref()),
            tools,
        }
    }
}

#[async_trait]
impl GeneratorBackend for AnthropicGenerator {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model_id(&self) -> &str {
        self.model.as_str()
    }

    async fn call(&self, request: &GeneratorRequest) -> Result<GeneratorResponse, SyllabusError> {
        let body = self.build_request_body(request);
        let url = format!("{}/messages", self.base_url);

        debug!(
            model = self.model.as_str(),
            messages = body.messages.len(),
            tools = body.tools.map_or(0, |t| t.len()),
            "Anthropic call"
        );

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(&self.api_key, API_VERSION))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let raw = resp.text().await?;
        let data: MessagesResponse = serde_json::from_str(&raw)?;

        let content = data
            .content
            .into_iter()
            .filter_map(|block| match block {
                WireBlock::Text { text } => Some(ContentBlock::Text { text }),
                WireBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse(ToolInvocation { id, name, input }))
                }
                WireBlock::Other => None,
            })
            .collect();

        Ok(GeneratorResponse {
            stop_reason: StopReason::from_wire(data.stop_reason.as_deref()),
            content,
            usage: Usage {
                input_tokens: data.usage.input_tokens,
                output_tokens: data.usage.output_tokens,
                cache_read_tokens: data.usage.cache_read_input_tokens,
                cache_creation_tokens: data.usage.cache_creation_input_tokens,
            },
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a ToolChoice>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: Vec<&'a ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<WireBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    cache_read_input_tokens: Option<u32>,
    cache_creation_input_tokens: Option<u32>,
}
