//! Shared test helpers: scripted generator and mock course index.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use syllabus::error::SyllabusError;
use syllabus::ingest::{Course, CourseChunk, Lesson};
use syllabus::provider::{GeneratorBackend, GeneratorRequest, GeneratorResponse};
use syllabus::search::{ChunkMetadata, CourseIndex, SearchResults};
use syllabus::types::*;

/// A generator that replays queued responses and records every request.
pub struct MockGenerator {
    responses: Mutex<VecDeque<Result<GeneratorResponse, SyllabusError>>>,
    requests: Mutex<Vec<GeneratorRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a direct answer.
    pub fn queue_response(&self, text: &str) {
        self.push(Ok(GeneratorResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                ..Default::default()
            },
        }));
    }

    /// Queue a single tool invocation.
    pub fn queue_tool_call(&self, id: &str, name: &str, input: serde_json::Value) {
        self.queue_tool_calls(vec![(id, name, input)]);
    }

    /// Queue one response carrying several invocations, in order.
    pub fn queue_tool_calls(&self, calls: Vec<(&str, &str, serde_json::Value)>) {
        let content = calls
            .into_iter()
            .map(|(id, name, input)| {
                ContentBlock::ToolUse(ToolInvocation {
                    id: id.to_string(),
                    name: name.to_string(),
                    input,
                })
            })
            .collect();
        self.push(Ok(GeneratorResponse {
            stop_reason: StopReason::ToolUse,
            content,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                ..Default::default()
            },
        }));
    }

    pub fn queue_raw(&self, response: GeneratorResponse) {
        self.push(Ok(response));
    }

    pub fn queue_error(&self, error: SyllabusError) {
        self.push(Err(error));
    }

    fn push(&self, reply: Result<GeneratorResponse, SyllabusError>) {
        self.responses.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<GeneratorRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GeneratorBackend for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn call(&self, request: &GeneratorRequest) -> Result<GeneratorResponse, SyllabusError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GeneratorResponse::text("Mock response")))
    }
}

/// Arguments a [`MockIndex`] search was called with.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub query: String,
    pub course_name: Option<String>,
    pub lesson_number: Option<u32>,
}

/// Course index returning canned search results.
pub struct MockIndex {
    results: Mutex<Result<SearchResults, String>>,
    courses: Vec<Course>,
    searches: Mutex<Vec<SearchCall>>,
}

impl MockIndex {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            results: Mutex::new(Ok(SearchResults::default())),
            courses,
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(self, results: SearchResults) -> Self {
        *self.results.lock().unwrap() = Ok(results);
        self
    }

    /// Make `search` itself fail.
    pub fn failing(self, message: &str) -> Self {
        *self.results.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn searches(&self) -> Vec<SearchCall> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseIndex for MockIndex {
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        _limit: Option<usize>,
    ) -> Result<SearchResults, SyllabusError> {
        self.searches.lock().unwrap().push(SearchCall {
            query: query.to_string(),
            course_name: course_name.map(str::to_string),
            lesson_number,
        });
        self.results
            .lock()
            .unwrap()
            .clone()
            .map_err(SyllabusError::Ingestion)
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        self.courses
            .iter()
            .find(|c| c.title == course_title)?
            .lesson(lesson_number)?
            .lesson_link
            .clone()
    }

    async fn resolve_course_name(&self, name: &str) -> Option<String> {
        let needle = name.to_lowercase();
        self.courses
            .iter()
            .find(|c| c.title.to_lowercase().contains(&needle))
            .map(|c| c.title.clone())
    }

    async fn course(&self, title: &str) -> Option<Course> {
        self.courses.iter().find(|c| c.title == title).cloned()
    }

    async fn course_titles(&self) -> Vec<String> {
        self.courses.iter().map(|c| c.title.clone()).collect()
    }

    async fn add_course(&self, _course: Course, _chunks: Vec<CourseChunk>) -> Result<(), SyllabusError> {
        Err(SyllabusError::Ingestion("mock index is read-only".into()))
    }

    async fn clear(&self) -> Result<(), SyllabusError> {
        Ok(())
    }
}

pub const COMPUTER_USE: &str = "Building Towards Computer Use with Anthropic";

pub fn sample_course() -> Course {
    Course {
        title: COMPUTER_USE.to_string(),
        course_link: Some(
            "https://www.deeplearning.ai/short-courses/building-toward-computer-use-with-anthropic/"
                .into(),
        ),
        instructor: Some("Colt Steele".into()),
        lessons: vec![
            Lesson {
                lesson_number: 0,
                title: "Introduction".into(),
                lesson_link: Some("https://learn.deeplearning.ai/lesson/0".into()),
            },
            Lesson {
                lesson_number: 1,
                title: "Getting Started with Anthropic".into(),
                lesson_link: Some("https://learn.deeplearning.ai/lesson/1".into()),
            },
        ],
    }
}

pub fn sample_results() -> SearchResults {
    SearchResults {
        documents: vec![
            "Lesson 0 content: This course teaches you about computer use capabilities.".into(),
            "Lesson 1 content: Learn to make basic API requests to the model.".into(),
        ],
        metadata: vec![
            ChunkMetadata {
                course_title: Some(COMPUTER_USE.into()),
                lesson_number: Some(0),
                chunk_index: Some(0),
            },
            ChunkMetadata {
                course_title: Some(COMPUTER_USE.into()),
                lesson_number: Some(1),
                chunk_index: Some(1),
            },
        ],
        distances: vec![0.1, 0.2],
        error: None,
    }
}

/// A course document in the on-disk format.
pub fn course_document(title: &str, lessons: &[(u32, &str, &str)]) -> String {
    let mut doc = format!(
        "Course Title: {title}\nCourse Link: https://example.com/course\nCourse Instructor: Test Instructor\n\n"
    );
    for (number, lesson_title, body) in lessons {
        doc.push_str(&format!(
            "Lesson {number}: {lesson_title}\nLesson Link: https://example.com/lesson/{number}\n{body}\n\n"
        ));
    }
    doc
}
