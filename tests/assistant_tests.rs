//! End-to-end course assistant behaviour with a scripted generator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{course_document, MockGenerator};
use pretty_assertions::assert_eq;
use serde_json::json;
use syllabus::assistant::CourseAssistant;
use syllabus::config::SyllabusConfig;
use syllabus::error::SyllabusError;
use syllabus::provider::{GeneratorBackend, GeneratorRequest, GeneratorResponse};
use syllabus::search::MemoryIndex;
use syllabus::session::{InMemorySessionStore, SessionStore};

fn docs_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("mcp.txt"),
        course_document(
            "MCP: Build Rich-Context AI Apps",
            &[
                (0, "Introduction", "MCP standardizes how models reach tools and data."),
                (1, "Architecture", "Hosts run clients. Clients connect to servers."),
            ],
        ),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("computer_use.md"),
        course_document(
            "Building Towards Computer Use with Anthropic",
            &[(0, "Introduction", "Computer use lets a model operate a desktop.")],
        ),
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.pdf"), "ignored").unwrap();
    dir
}

fn assistant(backend: Arc<MockGenerator>) -> (CourseAssistant, Arc<InMemorySessionStore>) {
    let config = SyllabusConfig::default();
    let sessions = Arc::new(InMemorySessionStore::new(config.max_history));
    let assistant = CourseAssistant::new(
        config,
        backend,
        Arc::new(MemoryIndex::new(5)),
        sessions.clone(),
    )
    .unwrap();
    (assistant, sessions)
}

#[tokio::test]
async fn registers_search_then_outline() {
    let (assistant, _) = assistant(Arc::new(MockGenerator::new()));
    assert_eq!(
        assistant.registry().names(),
        vec!["search_course_content", "get_course_outline"]
    );
}

#[tokio::test]
async fn loads_folder_and_skips_known_courses() {
    let docs = docs_dir();
    let (assistant, _) = assistant(Arc::new(MockGenerator::new()));

    let (courses, chunks) = assistant.load_course_folder(docs.path(), false).await.unwrap();
    assert_eq!(courses, 2);
    assert_eq!(chunks, 3);

    let again = assistant.load_course_folder(docs.path(), false).await.unwrap();
    assert_eq!(again, (0, 0));

    let analytics = assistant.analytics().await;
    assert_eq!(analytics.total_courses, 2);
    assert!(analytics
        .course_titles
        .contains(&"MCP: Build Rich-Context AI Apps".to_string()));

    let reloaded = assistant.load_course_folder(docs.path(), true).await.unwrap();
    assert_eq!(reloaded, (2, 3));
}

#[tokio::test]
async fn missing_folder_loads_nothing() {
    let (assistant, _) = assistant(Arc::new(MockGenerator::new()));
    let loaded = assistant
        .load_course_folder(std::path::Path::new("/definitely/not/here"), false)
        .await
        .unwrap();
    assert_eq!(loaded, (0, 0));
}

#[tokio::test]
async fn query_runs_search_tool_and_returns_sources() {
    let docs = docs_dir();
    let backend = Arc::new(MockGenerator::new());
    backend.queue_tool_call(
        "toolu_1",
        "search_course_content",
        json!({"query": "clients servers", "course_name": "MCP"}),
    );
    backend.queue_response("Hosts run clients that connect to servers.");

    let (assistant, _) = assistant(backend.clone());
    assistant.load_course_folder(docs.path(), false).await.unwrap();

    let response = assistant.query("How is MCP structured?", None).await;

    assert_eq!(response.answer, "Hosts run clients that connect to servers.");
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].text, "MCP: Build Rich-Context AI Apps - Lesson 1");
    assert_eq!(
        response.sources[0].link.as_deref(),
        Some("https://example.com/lesson/1")
    );

    let requests = backend.requests();
    let tool_result = requests[1].messages[2].tool_result_blocks()[0].content.clone();
    assert!(tool_result.starts_with("[MCP: Build Rich-Context AI Apps - Lesson 1]"));
}

#[tokio::test]
async fn outline_tool_is_reachable() {
    let docs = docs_dir();
    let backend = Arc::new(MockGenerator::new());
    backend.queue_tool_call("toolu_1", "get_course_outline", json!({"course_name": "MCP"}));
    backend.queue_response("It has two lessons.");

    let (assistant, _) = assistant(backend.clone());
    assistant.load_course_folder(docs.path(), false).await.unwrap();

    let response = assistant.query("What lessons does MCP have?", None).await;
    assert_eq!(response.answer, "It has two lessons.");

    let requests = backend.requests();
    let outline = requests[1].messages[2].tool_result_blocks()[0].content.clone();
    assert!(outline.contains("**Lessons (2 total):**"));
    assert!(outline.contains("  1. Architecture"));
}

#[tokio::test]
async fn session_history_flows_into_the_next_query() {
    let backend = Arc::new(MockGenerator::new());
    backend.queue_response("MCP is a protocol.");
    backend.queue_response("It was released by Anthropic.");

    let (assistant, sessions) = assistant(backend.clone());
    let session = assistant.new_session().unwrap();

    let first = assistant.query("What is MCP?", Some(&session)).await;
    assert_eq!(first.session_id.as_deref(), Some(session.as_str()));
    assistant.query("Who made it?", Some(&session)).await;

    let requests = backend.requests();
    assert!(!requests[0].system.contains("Previous conversation:"));
    assert!(requests[1]
        .system
        .ends_with("Previous conversation:\nUser: What is MCP?\nAssistant: MCP is a protocol."));

    assert_eq!(
        sessions.get_history(&session).unwrap().as_deref(),
        Some(
            "User: What is MCP?\nAssistant: MCP is a protocol.\n\
             User: Who made it?\nAssistant: It was released by Anthropic."
        )
    );
}

#[tokio::test]
async fn query_without_session_records_nothing() {
    let (assistant, sessions) = assistant(Arc::new(MockGenerator::new()));
    let response = assistant.query("Hello", None).await;

    assert_eq!(response.answer, "Mock response");
    assert_eq!(response.session_id, None);
    assert!(sessions.session_ids().is_empty());
}

#[tokio::test]
async fn invalid_key_gets_setup_hint() {
    let backend = Arc::new(MockGenerator::new());
    backend.queue_error(SyllabusError::Authentication("invalid x-api-key".into()));

    let (assistant, _) = assistant(backend);
    let response = assistant.query("What is computer use?", None).await;

    assert_eq!(
        response.answer,
        "Query failed: Invalid API key. Please configure your Anthropic API key in the .env file."
    );
    assert!(response.sources.is_empty());
}

#[tokio::test]
async fn other_backend_failures_name_the_round() {
    let backend = Arc::new(MockGenerator::new());
    backend.queue_tool_call("toolu_1", "search_course_content", json!({"query": "x"}));
    backend.queue_error(SyllabusError::api(500, "Internal server error"));

    let (assistant, _) = assistant(backend);
    let response = assistant.query("q", None).await;

    assert_eq!(
        response.answer,
        "Query failed: Generation failed in round 2: API error (status 500): Internal server error"
    );
}

struct StalledGenerator;

#[async_trait]
impl GeneratorBackend for StalledGenerator {
    fn name(&self) -> &str {
        "stalled"
    }

    fn model_id(&self) -> &str {
        "stalled-1"
    }

    async fn call(&self, _request: &GeneratorRequest) -> Result<GeneratorResponse, SyllabusError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(GeneratorResponse::text("too late"))
    }
}

#[tokio::test(start_paused = true)]
async fn slow_generator_times_out() {
    let config = SyllabusConfig {
        request_timeout_secs: 2,
        ..Default::default()
    };
    let assistant = CourseAssistant::in_memory(config, Arc::new(StalledGenerator)).unwrap();

    let response = assistant.query("q", None).await;
    assert_eq!(response.answer, "Query failed: Timeout after 2000ms");
}

#[tokio::test]
async fn failed_queries_leave_no_trace_in_history() {
    let backend = Arc::new(MockGenerator::new());
    backend.queue_error(SyllabusError::api(500, "Internal server error"));
    backend.queue_response("ok");

    let (assistant, sessions) = assistant(backend.clone());
    let session = assistant.new_session().unwrap();

    let first = assistant.query("first", Some(&session)).await;
    assert!(first.answer.starts_with("Query failed:"));
    assert_eq!(sessions.get_history(&session).unwrap(), None);

    assistant.query("second", Some(&session)).await;

    assert!(!backend.requests()[1].system.contains("Previous conversation:"));
    assert_eq!(
        sessions.get_history(&session).unwrap().as_deref(),
        Some("User: second\nAssistant: ok")
    );
}

#[tokio::test]
async fn cleared_session_starts_fresh() {
    let backend = Arc::new(MockGenerator::new());
    backend.queue_response("MCP is a protocol.");
    backend.queue_response("Hello again.");

    let (assistant, sessions) = assistant(backend.clone());
    let session = assistant.new_session().unwrap();

    assistant.query("What is MCP?", Some(&session)).await;
    assistant.clear_session(&session).unwrap();
    assert_eq!(sessions.get_history(&session).unwrap(), None);

    assistant.query("Hi", Some(&session)).await;
    assert!(!backend.requests()[1].system.contains("What is MCP?"));
}

#[tokio::test]
async fn blank_question_never_reaches_the_generator() {
    let backend = Arc::new(MockGenerator::new());
    let (assistant, _) = assistant(backend.clone());

    let response = assistant.query("   ", None).await;

    assert_eq!(
        response.answer,
        "Query failed: Invalid argument: query must not be empty"
    );
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn strict_query_offers_tools_and_counts_tool_failures() {
    let docs = docs_dir();
    let backend = Arc::new(MockGenerator::new());
    backend.queue_tool_calls(vec![
        ("toolu_1", "get_course_outline", json!({"course_name": "MCP"})),
        ("toolu_2", "get_course_outline", json!({})),
    ]);
    backend.queue_response("MCP has two lessons.");

    let (assistant, sessions) = assistant(backend.clone());
    assistant.load_course_folder(docs.path(), false).await.unwrap();
    let session = assistant.new_session().unwrap();

    let output = assistant
        .try_query("What is computer use?", Some(&session))
        .await
        .unwrap();

    assert!(backend.requests()[0].offers_tools());
    assert_eq!(output.rounds, 1);
    assert_eq!(output.tool_errors, 1);
    assert_eq!(
        sessions.get_history(&session).unwrap().as_deref(),
        Some("User: What is computer use?\nAssistant: MCP has two lessons.")
    );
}

#[tokio::test]
async fn strict_query_surfaces_backend_failures() {
    let backend = Arc::new(MockGenerator::new());
    backend.queue_error(SyllabusError::Authentication("invalid x-api-key".into()));

    let (assistant, sessions) = assistant(backend);
    let session = assistant.new_session().unwrap();

    let err = assistant.try_query("q", Some(&session)).await.unwrap_err();
    assert_eq!(err.failed_round(), Some(1));
    assert_eq!(sessions.get_history(&session).unwrap(), None);
}
