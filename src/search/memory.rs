//! In-process keyword index.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ChunkMetadata, CourseIndex, SearchResults};
use crate::error::{Result, SyllabusError};
use crate::ingest::{Course, CourseChunk};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "do", "does", "for", "how", "i", "in", "is", "it", "me", "of",
    "on", "or", "the", "to", "what", "with",
];

#[derive(Debug, Default)]
struct IndexState {
    courses: Vec<Course>,
    chunks: Vec<CourseChunk>,
}

/// Ranks chunks by the share of query terms they contain.
#[derive(Debug)]
pub struct MemoryIndex {
    state: RwLock<IndexState>,
    max_results: usize,
}

impl MemoryIndex {
    pub fn new(max_results: usize) -> Self {
        Self {
            state: RwLock::default(),
            max_results,
        }
    }

    pub async fn chunk_count(&self) -> usize {
        self.state.read().await.chunks.len()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl CourseIndex for MemoryIndex {
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> Result<SearchResults> {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await {
                Some(title) => Some(title),
                None => {
                    return Ok(SearchResults::empty(format!(
                        "No course found matching '{name}'"
                    )))
                }
            },
            None => None,
        };

        let terms = terms(query);
        if terms.is_empty() {
            return Ok(SearchResults::default());
        }

        let state = self.state.read().await;
        let mut scored: Vec<(f32, &CourseChunk)> = state
            .chunks
            .iter()
            .filter(|c| course_title.as_deref().map_or(true, |t| c.course_title == t))
            .filter(|c| lesson_number.map_or(true, |n| c.lesson_number == Some(n)))
            .filter_map(|chunk| {
                let words = terms_of(&chunk.content);
                let matched = terms.iter().filter(|t| words.contains(t.as_str())).count();
                (matched > 0).then(|| (matched as f32 / terms.len() as f32, chunk))
            })
            .collect();
        // stable: ties keep insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(limit.unwrap_or(self.max_results));

        debug!(query, hits = scored.len(), "memory index search");

        let mut results = SearchResults::default();
        for (ratio, chunk) in scored {
            results.documents.push(chunk.content.clone());
            results.metadata.push(ChunkMetadata::from(chunk));
            results.distances.push(1.0 - ratio);
        }
        Ok(results)
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        let state = self.state.read().await;
        state
            .courses
            .iter()
            .find(|c| c.title == course_title)?
            .lesson(lesson_number)?
            .lesson_link
            .clone()
    }

    async fn resolve_course_name(&self, name: &str) -> Option<String> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let state = self.state.read().await;
        let titles: Vec<&str> = state.courses.iter().map(|c| c.title.as_str()).collect();

        if let Some(title) = titles.iter().find(|t| t.to_lowercase() == needle) {
            return Some(title.to_string());
        }
        if let Some(title) = titles.iter().find(|t| t.to_lowercase().contains(&needle)) {
            return Some(title.to_string());
        }

        let wanted = terms(name);
        titles
            .iter()
            .map(|title| {
                let words = terms_of(title);
                (wanted.iter().filter(|w| words.contains(w.as_str())).count(), *title)
            })
            .filter(|(overlap, _)| *overlap > 0)
            // first title wins a tie
            .fold(None, |best: Option<(usize, &str)>, candidate| match best {
                Some(b) if b.0 >= candidate.0 => Some(b),
                _ => Some(candidate),
            })
            .map(|(_, title)| title.to_string())
    }

    async fn course(&self, title: &str) -> Option<Course> {
        let state = self.state.read().await;
        state.courses.iter().find(|c| c.title == title).cloned()
    }

    async fn course_titles(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.courses.iter().map(|c| c.title.clone()).collect()
    }

    async fn add_course(&self, course: Course, chunks: Vec<CourseChunk>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.courses.iter().any(|c| c.title == course.title) {
            return Err(SyllabusError::Ingestion(format!(
                "course already indexed: {}",
                course.title
            )));
        }
        state.courses.push(course);
        state.chunks.extend(chunks);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.courses.clear();
        state.chunks.clear();
        Ok(())
    }
}

/// Distinct lowercase query terms, stopwords removed, in first-seen order.
fn terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    words(text)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

fn terms_of(text: &str) -> HashSet<String> {
    words(text).collect()
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Lesson;

    async fn index() -> MemoryIndex {
        let index = MemoryIndex::new(5);
        let course = Course {
            title: "Building Towards Computer Use with Anthropic".into(),
            course_link: Some("https://example.com/cu".into()),
            instructor: Some("Colt Steele".into()),
            lessons: vec![Lesson {
                lesson_number: 1,
                title: "Getting Started".into(),
                lesson_link: Some("https://example.com/cu/1".into()),
            }],
        };
        let chunks = vec![
            chunk(&course.title, 0, 0, "Computer use lets models drive a desktop."),
            chunk(&course.title, 1, 1, "Make basic API requests to the model."),
        ];
        index.add_course(course, chunks).await.unwrap();
        index
            .add_course(Course::new("MCP: Build Rich-Context AI Apps"), vec![])
            .await
            .unwrap();
        index
    }

    fn chunk(title: &str, lesson: u32, idx: usize, text: &str) -> CourseChunk {
        CourseChunk {
            content: text.into(),
            course_title: title.into(),
            lesson_number: Some(lesson),
            chunk_index: idx,
        }
    }

    #[tokio::test]
    async fn resolves_partial_and_word_overlap_names() {
        let index = index().await;
        assert_eq!(
            index.resolve_course_name("computer use").await.as_deref(),
            Some("Building Towards Computer Use with Anthropic")
        );
        assert_eq!(
            index.resolve_course_name("rich context apps").await.as_deref(),
            Some("MCP: Build Rich-Context AI Apps")
        );
        assert_eq!(index.resolve_course_name("Quantum Knitting").await, None);
    }

    #[tokio::test]
    async fn ranks_by_term_overlap_with_filters() {
        let index = index().await;

        let results = index.search("API requests", None, None, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.metadata[0].lesson_number, Some(1));
        assert_eq!(results.distances[0], 0.0);

        let filtered = index
            .search("computer", Some("Anthropic"), Some(1), None)
            .await
            .unwrap();
        assert!(filtered.is_empty());
        assert!(filtered.error.is_none());
    }

    #[tokio::test]
    async fn unknown_course_is_reported_in_results() {
        let index = index().await;
        let results = index
            .search("anything", Some("Quantum Knitting"), None, None)
            .await
            .unwrap();
        assert_eq!(
            results.error.as_deref(),
            Some("No course found matching 'Quantum Knitting'")
        );
    }

    #[tokio::test]
    async fn duplicate_titles_are_rejected_and_clear_empties() {
        let index = index().await;
        assert!(index
            .add_course(Course::new("MCP: Build Rich-Context AI Apps"), vec![])
            .await
            .is_err());
        assert_eq!(
            index
                .lesson_link("Building Towards Computer Use with Anthropic", 1)
                .await
                .as_deref(),
            Some("https://example.com/cu/1")
        );

        index.clear().await.unwrap();
        assert!(index.course_titles().await.is_empty());
        assert_eq!(index.chunk_count().await, 0);
    }
}
