//! Turn orchestration: the bounded generate / dispatch / generate loop.
//!
//! A run sends the user's query, and while the generator keeps asking for
//! tools (and the round ceiling allows it) dispatches every requested
//! invocation in order, appends the results and calls the generator again.
//! The final call after the last permitted round omits tool schemas so the
//! generator has to answer in text.

pub mod prompt;

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{Result, SyllabusError};
use crate::provider::{GeneratorBackend, GeneratorRequest, GeneratorResponse};
use crate::tools::{CitationSink, ToolExecutionContext, ToolRegistry, ToolSchema};
use crate::types::*;

pub use prompt::{assemble_system, SYSTEM_PROMPT};

/// Default ceiling on tool-execution rounds per run.
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// Input to one orchestration run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub query: String,
    /// Serialized prior turns, placed in the system content of the first call.
    pub history: Option<String>,
    pub tool_schemas: Option<Vec<ToolSchema>>,
    pub registry: Option<Arc<ToolRegistry>>,
}

impl RunRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Option<String>) -> Self {
        self.history = history;
        self
    }

    /// Offer every tool in `registry` and dispatch through it.
    pub fn with_tools(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_schemas = Some(registry.schemas());
        self.registry = Some(registry);
        self
    }

    /// Override the advertised schema set (e.g. to offer a subset).
    pub fn with_schemas(mut self, schemas: Vec<ToolSchema>) -> Self {
        self.tool_schemas = Some(schemas);
        self
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub answer: String,
    /// Citations recorded by tools during this run only.
    pub citations: Vec<SourceCitation>,
    /// Tool-dispatch rounds executed.
    pub rounds: usize,
    /// Tool results reported back to the generator as errors.
    pub tool_errors: usize,
    /// Generator calls attempted, including a failed final one.
    pub generator_calls: usize,
    pub usage: Usage,
}

/// Drives runs against one generator backend.
///
/// Holds no per-run state, so a single orchestrator can serve concurrent
/// runs from a shared `Arc`.
pub struct TurnOrchestrator {
    backend: Arc<dyn GeneratorBackend>,
    system_prompt: String,
    settings: GenerationSettings,
    max_rounds: usize,
}

struct RoundState {
    round: usize,
    messages: Vec<Message>,
    latest: GeneratorResponse,
    max_rounds: usize,
}

impl RoundState {
    fn may_continue(&self) -> bool {
        self.round <= self.max_rounds && self.latest.requests_tools()
    }

    fn ceiling_reached(&self) -> bool {
        self.round >= self.max_rounds
    }
}

#[derive(Debug, Default)]
struct RunTally {
    generator_calls: usize,
    rounds: usize,
    tool_errors: usize,
    usage: Usage,
}

impl TurnOrchestrator {
    pub fn new(backend: Arc<dyn GeneratorBackend>) -> Self {
        Self {
            backend,
            system_prompt: SYSTEM_PROMPT.to_string(),
            settings: GenerationSettings::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn backend(&self) -> &Arc<dyn GeneratorBackend> {
        &self.backend
    }

    /// Run and surface generator failures as `Err(GeneratorCall { round, .. })`.
    ///
    /// Tool failures never reach this level; they are reported back to the
    /// generator as error results.
    pub async fn try_run(&self, request: RunRequest) -> Result<RunOutput> {
        let (tally, outcome, citations) = self.execute(request).await;
        Ok(RunOutput {
            answer: outcome?,
            citations,
            rounds: tally.rounds,
            tool_errors: tally.tool_errors,
            generator_calls: tally.generator_calls,
            usage: tally.usage,
        })
    }

    /// Run and always produce an answer.
    ///
    /// A generator failure becomes the answer text
    /// `Generation failed in round {n}: {error}`.
    pub async fn run(&self, request: RunRequest) -> RunOutput {
        let (tally, outcome, citations) = self.execute(request).await;
        RunOutput {
            answer: outcome.unwrap_or_else(|e| e.to_string()),
            citations,
            rounds: tally.rounds,
            tool_errors: tally.tool_errors,
            generator_calls: tally.generator_calls,
            usage: tally.usage,
        }
    }

    async fn execute(
        &self,
        request: RunRequest,
    ) -> (RunTally, Result<String>, Vec<SourceCitation>) {
        let run_id = Uuid::new_v4();
        let span = info_span!("orchestrator_run", %run_id, model = self.backend.model_id());

        async move {
            let ctx = ToolExecutionContext::new(CitationSink::new());
            let mut tally = RunTally::default();
            let outcome = self.drive(request, &ctx, &mut tally).await;
            let citations = ctx.citations.drain();

            info!(
                generator_calls = tally.generator_calls,
                rounds = tally.rounds,
                tool_errors = tally.tool_errors,
                citations = citations.len(),
                ok = outcome.is_ok(),
                "run finished"
            );
            (tally, outcome, citations)
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        request: RunRequest,
        ctx: &ToolExecutionContext,
        tally: &mut RunTally,
    ) -> Result<String> {
        let RunRequest {
            query,
            history,
            tool_schemas,
            registry,
        } = request;

        if query.trim().is_empty() {
            return Err(SyllabusError::InvalidArgument("query must not be empty".into()));
        }

        let system = assemble_system(&self.system_prompt, history.as_deref());
        let tools = tool_schemas.filter(|schemas| !schemas.is_empty());
        let messages = vec![Message::user(query)];

        let first = self.call(&messages, &system, tools.clone(), tally).await?;
        let mut state = RoundState {
            round: 1,
            messages,
            latest: first,
            max_rounds: self.max_rounds,
        };

        let Some(registry) = registry else {
            if state.latest.requests_tools() {
                debug!("tool use requested but no registry supplied; returning text as-is");
            }
            return Ok(state.latest.answer_text());
        };

        while state.may_continue() {
            let invocations: Vec<ToolInvocation> =
                state.latest.tool_invocations().into_iter().cloned().collect();
            state
                .messages
                .push(Message::assistant_blocks(state.latest.content.clone()));

            // One at a time: results must line up with the invocation order.
            let mut results = Vec::with_capacity(invocations.len());
            for invocation in &invocations {
                let result = dispatch_one(&registry, invocation, ctx).await;
                tally.tool_errors += usize::from(result.is_error);
                results.push(result);
            }
            state.messages.push(Message::tool_results(results));
            tally.rounds += 1;

            let next_tools = if state.ceiling_reached() {
                None
            } else {
                tools.clone()
            };
            state.latest = self.call(&state.messages, &system, next_tools, tally).await?;
            state.round += 1;
        }

        Ok(state.latest.answer_text())
    }

    async fn call(
        &self,
        messages: &[Message],
        system: &str,
        tools: Option<Vec<ToolSchema>>,
        tally: &mut RunTally,
    ) -> Result<GeneratorResponse> {
        tally.generator_calls += 1;
        let round = tally.generator_calls;

        let request = GeneratorRequest {
            messages: messages.to_vec(),
            system: system.to_string(),
            tool_choice: tools.as_ref().map(|_| ToolChoice::Auto),
            tools,
            settings: self.settings.clone(),
        };

        debug!(
            round,
            messages = request.messages.len(),
            tools = request.offers_tools(),
            "calling generator"
        );

        match self.backend.call(&request).await {
            Ok(response) => {
                tally.usage.merge(&response.usage);
                debug!(round, stop_reason = %response.stop_reason, "generator responded");
                Ok(response)
            }
            Err(e) => {
                warn!(round, error = %e, "generator call failed");
                Err(SyllabusError::generator_call(round, e))
            }
        }
    }
}

async fn dispatch_one(
    registry: &ToolRegistry,
    invocation: &ToolInvocation,
    ctx: &ToolExecutionContext,
) -> ToolResult {
    match registry
        .dispatch(&invocation.name, &invocation.input, ctx)
        .await
    {
        Ok(content) => ToolResult::success(&invocation.id, content),
        Err(e) => {
            warn!(tool = %invocation.name, error = %e, "tool execution failed");
            ToolResult::failure(&invocation.id, format!("Tool execution failed: {e}"))
        }
    }
}
