//! CLI command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{AskArgs, DocsArgs, SetupArgs};
use crate::assistant::{CourseAssistant, QueryResponse};
use crate::config::{SyllabusConfig, PLACEHOLDER_API_KEY};
use crate::error::SyllabusError;
use crate::ingest::{course_files, index_course_folder, read_course_file};
use crate::orchestrator::RunOutput;
use crate::provider::{create_backend, GeneratorBackend};
use crate::search::{CourseIndex, MemoryIndex};
use crate::session::{FileSessionStore, InMemorySessionStore, SessionStore};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

const DIAGNOSTIC_QUERY: &str = "What is computer use?";

/// Build an assistant over freshly loaded documents.
async fn build_assistant(
    config: SyllabusConfig,
    docs: &DocsArgs,
    sessions: Arc<dyn SessionStore>,
) -> Result<CourseAssistant, SyllabusError> {
    let backend: Arc<dyn GeneratorBackend> = Arc::from(create_backend(&config)?);
    let index = Arc::new(MemoryIndex::new(config.max_results));
    let docs_path = docs_path(&config, docs);

    let assistant = CourseAssistant::new(config, backend, index, sessions)?;
    assistant.load_course_folder(&docs_path, false).await?;
    Ok(assistant)
}

fn file_sessions(config: &SyllabusConfig) -> Arc<dyn SessionStore> {
    Arc::new(FileSessionStore::new(config.session_dir(), config.max_history))
}

/// Load the docs folder into a fresh index. Needs no API key.
async fn load_index(config: &SyllabusConfig, docs: &DocsArgs) -> Result<MemoryIndex, SyllabusError> {
    let index = MemoryIndex::new(config.max_results);
    index_course_folder(
        &index,
        &docs_path(config, docs),
        config.chunk_size,
        config.chunk_overlap,
        false,
    )
    .await?;
    Ok(index)
}

fn docs_path(config: &SyllabusConfig, docs: &DocsArgs) -> PathBuf {
    docs.docs.clone().unwrap_or_else(|| config.docs_path.clone())
}

fn print_response(response: &QueryResponse) {
    println!("{}", response.answer);
    if !response.sources.is_empty() {
        println!("\nSources:");
        for source in &response.sources {
            println!("  - {source}");
        }
    }
}

/// Handle `syllabus ask <question>`.
pub async fn handle_ask(config: SyllabusConfig, args: AskArgs) -> CliResult {
    let sessions = file_sessions(&config);
    let assistant = build_assistant(config, &args.docs, sessions).await?;
    let response = assistant
        .query(&args.question, args.session.as_deref())
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

/// Handle `syllabus chat`.
pub async fn handle_chat(config: SyllabusConfig, docs: DocsArgs) -> CliResult {
    let sessions = file_sessions(&config);
    let assistant = build_assistant(config, &docs, sessions).await?;
    let session_id = assistant.new_session()?;
    eprintln!("Session {session_id}. Type '/clear' to forget the conversation, 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }
        if question == "/clear" {
            assistant.clear_session(&session_id)?;
            println!("Conversation cleared.\n");
            continue;
        }

        let response = assistant.query(question, Some(&session_id)).await;
        print_response(&response);
        println!();
    }
    Ok(())
}

/// Handle `syllabus courses`.
pub async fn handle_courses(config: SyllabusConfig, docs: DocsArgs) -> CliResult {
    let index = load_index(&config, &docs).await?;
    let titles = index.course_titles().await;

    println!("{} course(s), {} chunk(s) indexed", titles.len(), index.chunk_count().await);
    for title in &titles {
        println!("  - {title}");
    }
    Ok(())
}

/// Handle `syllabus setup`: write a `.env` template unless one exists.
pub fn handle_setup(args: SetupArgs) -> CliResult {
    let created = write_env_template(&args.env_file)?;
    if created {
        println!("Created {}", args.env_file.display());
    } else {
        println!("{} already exists", args.env_file.display());
    }
    println!("Set ANTHROPIC_API_KEY in {} to your Anthropic API key.", args.env_file.display());
    println!("Keys are available at https://console.anthropic.com/");
    Ok(())
}

/// Returns `false` when the file is already there.
pub fn write_env_template(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(
        path,
        format!("# Anthropic API key for the course assistant\nANTHROPIC_API_KEY={PLACEHOLDER_API_KEY}\n"),
    )?;
    Ok(true)
}

fn report(name: &str, outcome: Result<String, String>) -> bool {
    match outcome {
        Ok(detail) => {
            println!("PASS  {name}: {detail}");
            true
        }
        Err(detail) => {
            println!("FAIL  {name}: {detail}");
            false
        }
    }
}

/// Handle `syllabus doctor`. Returns whether every check passed.
pub async fn handle_doctor(config: SyllabusConfig, docs: DocsArgs) -> CliResult<bool> {
    let mut healthy = true;

    let key = config.api_key().map(|_| "configured".to_string()).map_err(|_| {
        "missing or placeholder; run `syllabus setup` and edit .env".to_string()
    });
    let has_key = key.is_ok();
    healthy &= report("API key", key);

    let path = docs_path(&config, &docs);
    healthy &= report("Course documents", check_documents(&config, &path));

    let index = load_index(&config, &docs).await?;
    healthy &= report("Index", check_index(&index).await);

    if !has_key {
        println!("SKIP  Live query: no API key");
        return Ok(false);
    }

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(config.max_history));
    let assistant = build_assistant(config, &docs, sessions).await?;
    healthy &= report(
        "Tools",
        Ok(format!(
            "{} (up to {} round(s))",
            assistant.registry().names().join(", "),
            assistant.orchestrator().max_rounds()
        )),
    );

    let session = assistant.new_session()?;
    let model = assistant.orchestrator().backend().model_id().to_string();
    let live = match assistant.try_query(DIAGNOSTIC_QUERY, Some(&session)).await {
        Ok(output) => live_query_verdict(&model, &output),
        Err(e) => Err(format!("{e} ({:?})", e.category())),
    };
    healthy &= report("Live query", live);

    Ok(healthy)
}

async fn check_index(index: &MemoryIndex) -> Result<String, String> {
    let titles = index.course_titles().await;
    if titles.is_empty() {
        Err("no courses indexed".into())
    } else {
        Ok(format!(
            "{} course(s), {} chunk(s)",
            titles.len(),
            index.chunk_count().await
        ))
    }
}

/// A live run that reached an answer but had a tool fail still counts as a failure.
fn live_query_verdict(model: &str, output: &RunOutput) -> Result<String, String> {
    if output.tool_errors > 0 {
        return Err(format!(
            "{} of the tool call(s) failed; answer: {}",
            output.tool_errors,
            preview(&output.answer)
        ));
    }
    Ok(format!(
        "{model}, {} call(s), {} round(s), {} token(s), answer: {}",
        output.generator_calls,
        output.rounds,
        output.usage.total_tokens(),
        preview(&output.answer)
    ))
}

fn check_documents(config: &SyllabusConfig, path: &Path) -> Result<String, String> {
    if !path.is_dir() {
        return Err(format!("{} not found", path.display()));
    }
    let files = course_files(path).map_err(|e| e.to_string())?;
    let mut parsed = 0;
    for file in &files {
        match read_course_file(file, config.chunk_size, config.chunk_overlap) {
            Ok(_) => parsed += 1,
            Err(e) => println!("      {}: {e}", file.display()),
        }
    }
    if parsed == 0 {
        Err(format!("no readable course files in {}", path.display()))
    } else {
        Ok(format!("{parsed}/{} file(s) parsed", files.len()))
    }
}

fn preview(answer: &str) -> String {
    const LIMIT: usize = 80;
    let line = answer.lines().next().unwrap_or_default();
    if line.chars().count() > LIMIT {
        format!("{}...", line.chars().take(LIMIT).collect::<String>())
    } else {
        line.to_string()
    }
}
