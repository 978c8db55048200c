//! Course assistant: wires the index, tools, sessions and orchestrator together.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SyllabusConfig;
use crate::error::{ErrorCategory, Result, SyllabusError};
use crate::ingest::{index_course_file, index_course_folder};
use crate::orchestrator::{RunOutput, RunRequest, TurnOrchestrator};
use crate::provider::GeneratorBackend;
use crate::search::{CourseIndex, CourseOutlineTool, CourseSearchTool, MemoryIndex};
use crate::session::{InMemorySessionStore, SessionStore};
use crate::tools::ToolRegistry;
use crate::types::{GenerationSettings, SourceCitation};
use crate::util::timeout::with_timeout;

const INVALID_KEY_ANSWER: &str =
    "Query failed: Invalid API key. Please configure your Anthropic API key in the .env file.";

/// Answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

pub struct CourseAssistant {
    config: SyllabusConfig,
    orchestrator: TurnOrchestrator,
    registry: Arc<ToolRegistry>,
    index: Arc<dyn CourseIndex>,
    sessions: Arc<dyn SessionStore>,
}

impl CourseAssistant {
    /// Build an assistant and register the course tools (search, then outline).
    pub fn new(
        config: SyllabusConfig,
        backend: Arc<dyn GeneratorBackend>,
        index: Arc<dyn CourseIndex>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(index.clone())))?;
        registry.register(Arc::new(CourseOutlineTool::new(index.clone())))?;

        let settings = GenerationSettings::builder()
            .max_tokens(config.max_tokens)
            .temperature(config.temperature)
            .build();
        let orchestrator = TurnOrchestrator::new(backend)
            .with_settings(settings)
            .with_max_rounds(config.max_tool_rounds);

        Ok(Self {
            config,
            orchestrator,
            registry: Arc::new(registry),
            index,
            sessions,
        })
    }

    /// In-memory index and sessions sized from `config`.
    pub fn in_memory(config: SyllabusConfig, backend: Arc<dyn GeneratorBackend>) -> Result<Self> {
        let index = Arc::new(MemoryIndex::new(config.max_results));
        let sessions = Arc::new(InMemorySessionStore::new(config.max_history));
        Self::new(config, backend, index, sessions)
    }

    /// Answer `query`, using and extending the session's history when given.
    ///
    /// Never fails: errors become an answer starting with `Query failed:`.
    /// Only successful answers are recorded in the session.
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> QueryResponse {
        let (answer, sources) = match self.try_query(query, session_id).await {
            Ok(output) => (output.answer, output.citations),
            Err(e) => {
                warn!(error = %e, category = ?e.category(), "query failed");
                (failure_answer(&e), Vec::new())
            }
        };

        QueryResponse {
            answer,
            sources,
            session_id: session_id.map(str::to_string),
        }
    }

    /// Run the full tool-bearing query path and surface failures as `Err`.
    ///
    /// The exchange is appended to the session only when the run succeeds.
    pub async fn try_query(&self, query: &str, session_id: Option<&str>) -> Result<RunOutput> {
        let history = match session_id {
            Some(id) => self.sessions.get_history(id)?,
            None => None,
        };

        let request = RunRequest::new(query)
            .with_history(history)
            .with_tools(self.registry.clone());
        let output =
            with_timeout(self.config.request_timeout(), self.orchestrator.try_run(request)).await?;

        if let Some(id) = session_id {
            if let Err(e) = self.sessions.append_exchange(id, query, &output.answer) {
                warn!(session_id = id, error = %e, "could not record exchange");
            }
        }
        Ok(output)
    }

    pub fn new_session(&self) -> Result<String> {
        self.sessions.create_session()
    }

    /// Forget a session's exchanges; the id stays usable.
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        self.sessions.clear(session_id)
    }

    pub async fn load_course_file(&self, path: &Path) -> Result<(usize, usize)> {
        index_course_file(
            self.index.as_ref(),
            path,
            self.config.chunk_size,
            self.config.chunk_overlap,
        )
        .await
    }

    pub async fn load_course_folder(&self, dir: &Path, clear_existing: bool) -> Result<(usize, usize)> {
        index_course_folder(
            self.index.as_ref(),
            dir,
            self.config.chunk_size,
            self.config.chunk_overlap,
            clear_existing,
        )
        .await
    }

    pub async fn analytics(&self) -> CourseAnalytics {
        let course_titles = self.index.course_titles().await;
        CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        }
    }

    pub fn config(&self) -> &SyllabusConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &TurnOrchestrator {
        &self.orchestrator
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn index(&self) -> &Arc<dyn CourseIndex> {
        &self.index
    }
}

fn failure_answer(error: &SyllabusError) -> String {
    match error.category() {
        ErrorCategory::Authentication => INVALID_KEY_ANSWER.to_string(),
        _ => format!("Query failed: {error}"),
    }
}
