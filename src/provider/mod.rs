//! Generator backend trait and implementations.

pub mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;

use async_trait::async_trait;

use crate::error::SyllabusError;
use crate::tools::ToolSchema;
use crate::types::message::{collect_invocations, collect_text};
use crate::types::{ContentBlock, GenerationSettings, Message, StopReason, ToolChoice, ToolInvocation, Usage};

/// One call to a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorRequest {
    pub messages: Vec<Message>,
    pub system: String,
    pub tools: Option<Vec<ToolSchema>>,
    pub tool_choice: Option<ToolChoice>,
    pub settings: GenerationSettings,
}

impl GeneratorRequest {
    /// Whether tool schemas are attached to this call.
    pub fn offers_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|tools| !tools.is_empty())
    }
}

/// What a generator returned.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

impl GeneratorResponse {
    /// A plain answer with no tool use.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text { text: text.into() }],
            usage: Usage::default(),
        }
    }

    /// Concatenated text blocks; empty when the response has none.
    pub fn answer_text(&self) -> String {
        collect_text(&self.content)
    }

    /// Tool invocation blocks, in order.
    pub fn tool_invocations(&self) -> Vec<&ToolInvocation> {
        collect_invocations(&self.content)
    }

    /// Whether this response asks for tools and actually names at least one.
    pub fn requests_tools(&self) -> bool {
        self.stop_reason.wants_tools() && !self.tool_invocations().is_empty()
    }
}

/// Core trait implemented by every generator backend.
#[async_trait]
pub trait GeneratorBackend: Send + Sync {
    /// Backend name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// The model ID this backend serves.
    fn model_id(&self) -> &str;

    /// Issue one generator call. Transport, auth and rate-limit failures
    /// come back as `Err`; the caller decides whether they are fatal.
    async fn call(&self, request: &GeneratorRequest) -> Result<GeneratorResponse, SyllabusError>;
}

/// Create the configured backend.
#[cfg(feature = "anthropic")]
pub fn create_backend(
    config: &crate::config::SyllabusConfig,
) -> Result<Box<dyn GeneratorBackend>, SyllabusError> {
    let api_key = config.api_key()?;
    let model: crate::models::AnthropicModel = config
        .model
        .parse()
        .map_err(|_| SyllabusError::Configuration(format!("Unknown model: {}", config.model)))?;
    Ok(Box::new(anthropic::AnthropicGenerator::new(
        model,
        api_key,
        config.anthropic_base_url.clone(),
    )))
}
