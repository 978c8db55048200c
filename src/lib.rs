//! Syllabus: question answering over course materials.
//!
//! A generator model answers questions about indexed courses, calling a
//! content-search and a course-outline tool over at most two sequential
//! rounds per question.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use syllabus::prelude::*;
//!
//! # async fn example() -> syllabus::error::Result<()> {
//! let config = SyllabusConfig::load(None)?;
//! let backend: Arc<dyn GeneratorBackend> = Arc::from(syllabus::provider::create_backend(&config)?);
//! let docs = config.docs_path.clone();
//! let assistant = CourseAssistant::in_memory(config, backend)?;
//! assistant.load_course_folder(&docs, false).await?;
//!
//! let response = assistant.query("What is covered in lesson 1 of the MCP course?", None).await;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod search;
pub mod session;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Result, SyllabusError};
