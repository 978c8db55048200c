//! Retrieval over indexed course content.

pub mod memory;
pub mod tools;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ingest::{Course, CourseChunk};

pub use memory::MemoryIndex;
pub use tools::{CourseOutlineTool, CourseSearchTool};

/// Where a hit came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
    pub chunk_index: Option<usize>,
}

impl From<&CourseChunk> for ChunkMetadata {
    fn from(chunk: &CourseChunk) -> Self {
        Self {
            course_title: Some(chunk.course_title.clone()),
            lesson_number: chunk.lesson_number,
            chunk_index: Some(chunk.chunk_index),
        }
    }
}

/// Ranked hits, or an error message the index wants shown as-is.
///
/// `documents`, `metadata` and `distances` are parallel; lower distance
/// is a better match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Hits paired with their metadata.
    pub fn hits(&self) -> impl Iterator<Item = (&str, &ChunkMetadata)> {
        self.documents.iter().map(String::as_str).zip(self.metadata.iter())
    }
}

/// Course content index consumed by the retrieval tools.
#[async_trait]
pub trait CourseIndex: Send + Sync {
    /// Search chunk text, optionally restricted to a course (by fuzzy name)
    /// and lesson. `limit` of `None` uses the index's default.
    ///
    /// An unresolvable course name is reported through
    /// [`SearchResults::error`], not as `Err`.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> Result<SearchResults>;

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String>;

    /// Map a user-supplied course name to an indexed title.
    async fn resolve_course_name(&self, name: &str) -> Option<String>;

    async fn course(&self, title: &str) -> Option<Course>;

    async fn course_titles(&self) -> Vec<String>;

    async fn add_course(&self, course: Course, chunks: Vec<CourseChunk>) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
