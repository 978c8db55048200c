//! Command-line interface for Syllabus.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Syllabus CLI
#[derive(Parser, Debug)]
#[command(name = "syllabus", version, about = "Ask questions about course materials")]
pub struct Cli {
    /// Config file (defaults to ~/.syllabus/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one question
    Ask(AskArgs),
    /// Interactive question loop sharing one session
    Chat(DocsArgs),
    /// List indexed courses
    Courses(DocsArgs),
    /// Create a .env template for the API key
    Setup(SetupArgs),
    /// Check the API key, course documents and a live query
    Doctor(DocsArgs),
}

/// Where course documents are loaded from.
#[derive(Args, Debug, Clone, Default)]
pub struct DocsArgs {
    /// Course documents folder (overrides the configured docs path)
    #[arg(long)]
    pub docs: Option<PathBuf>,
}

/// Arguments for `syllabus ask`.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question
    pub question: String,

    /// Session id to read history from and append to
    #[arg(long)]
    pub session: Option<String>,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub docs: DocsArgs,
}

/// Arguments for `syllabus setup`.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Where to write the template
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
}

/// Log to stderr; `RUST_LOG` overrides the default `syllabus=info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("syllabus=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
