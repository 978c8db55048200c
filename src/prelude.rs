//! Convenience re-exports for common use.

pub use crate::assistant::{CourseAnalytics, CourseAssistant, QueryResponse};
pub use crate::config::SyllabusConfig;
pub use crate::error::{Result, SyllabusError};
pub use crate::orchestrator::{RunOutput, RunRequest, TurnOrchestrator};
pub use crate::provider::{GeneratorBackend, GeneratorRequest, GeneratorResponse};
pub use crate::search::{CourseIndex, MemoryIndex, SearchResults};
pub use crate::session::{InMemorySessionStore, SessionStore};
pub use crate::tools::{Tool, ToolArguments, ToolParameters, ToolRegistry};
pub use crate::types::{
    ContentBlock, GenerationSettings, Message, Role, SourceCitation, StopReason, ToolInvocation,
    ToolResult, Usage,
};
