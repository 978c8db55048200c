//! Name-keyed tool registry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{FnTool, Tool, ToolExecutionContext};
use super::types::{ToolParameters, ToolSchema};
use super::validation::validate_input;
use crate::error::{Result, SyllabusError};

/// Maps tool names to handlers and keeps their schemas in registration order.
///
/// Populated at startup, then shared read-only (behind an `Arc`) by every run.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails with `DuplicateTool` if the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(SyllabusError::DuplicateTool(name));
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Register an async closure as a tool.
    pub fn register_fn<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        self.register(Arc::new(FnTool::new(name, description, parameters, handler)))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| &self.tools[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Look up `name`, validate `input` against its schema and run it.
    ///
    /// Handler errors are returned as-is; turning them into tool result
    /// content is the caller's job.
    pub async fn dispatch(
        &self,
        name: &str,
        input: &serde_json::Value,
        ctx: &ToolExecutionContext,
    ) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| SyllabusError::UnknownTool(name.to_string()))?;
        validate_input(name, input, &tool.parameters().schema)?;

        debug!(tool = name, "dispatching tool");
        tool.execute(&ToolArguments::new(input.clone()), ctx).await
    }

    /// All schemas in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|tool| tool.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
