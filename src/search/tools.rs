//! The two course tools offered to the generator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{CourseIndex, SearchResults};
use crate::error::Result;
use crate::tools::{Tool, ToolArguments, ToolExecutionContext, ToolParameters};
use crate::types::SourceCitation;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";
pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

/// Content search with optional course and lesson filters.
pub struct CourseSearchTool {
    index: Arc<dyn CourseIndex>,
    parameters: ToolParameters,
}

impl CourseSearchTool {
    pub fn new(index: Arc<dyn CourseIndex>) -> Self {
        Self {
            index,
            parameters: ToolParameters::object()
                .string("query", "What to search for in the course content", true)
                .string(
                    "course_name",
                    "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
                    false,
                )
                .integer(
                    "lesson_number",
                    "Specific lesson number to search within (e.g. 1, 2, 3)",
                    false,
                )
                .build(),
        }
    }

    async fn format_results(&self, results: &SearchResults, ctx: &ToolExecutionContext) -> String {
        let mut blocks = Vec::with_capacity(results.len());

        for (document, meta) in results.hits() {
            let course = meta.course_title.as_deref().unwrap_or("unknown");
            let label = match meta.lesson_number {
                Some(n) => format!("{course} - Lesson {n}"),
                None => course.to_string(),
            };
            blocks.push(format!("[{label}]\n{document}"));

            let link = match meta.course_title.as_deref() {
                Some(title) => self.source_link(title, meta.lesson_number).await,
                None => None,
            };
            ctx.citations.push(SourceCitation::new(label, link));
        }

        blocks.join("\n\n")
    }

    // Lesson link when there is one, else the course link.
    async fn source_link(&self, course_title: &str, lesson_number: Option<u32>) -> Option<String> {
        if let Some(n) = lesson_number {
            if let Some(link) = self.index.lesson_link(course_title, n).await {
                return Some(link);
            }
        }
        self.index.course(course_title).await?.course_link
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search course materials with smart course name matching and lesson filtering"
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String> {
        let query = args.get_str("query")?;
        let course_name = args.get_str_opt("course_name");
        let lesson_number = args.get_u32_opt("lesson_number")?;

        let results = match self
            .index
            .search(query, course_name, lesson_number, None)
            .await
        {
            Ok(results) => results,
            Err(e) => return Ok(format!("Search failed: {e}")),
        };

        if let Some(error) = &results.error {
            return Ok(error.clone());
        }
        if results.is_empty() {
            return Ok(no_results_message(course_name, lesson_number));
        }

        debug!(hits = results.len(), "course search");
        Ok(self.format_results(&results, ctx).await)
    }
}

fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{course}'"));
    }
    if let Some(n) = lesson_number {
        message.push_str(&format!(" in lesson {n}"));
    }
    message.push('.');
    message
}

/// Course title, link and numbered lesson list.
pub struct CourseOutlineTool {
    index: Arc<dyn CourseIndex>,
    parameters: ToolParameters,
}

impl CourseOutlineTool {
    pub fn new(index: Arc<dyn CourseIndex>) -> Self {
        Self {
            index,
            parameters: ToolParameters::object()
                .string(
                    "course_name",
                    "Course title or part of it (e.g. 'MCP', 'Computer Use')",
                    true,
                )
                .build(),
        }
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        OUTLINE_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get a course outline: title, course link and the complete numbered lesson list"
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String> {
        let name = args.get_str("course_name")?;
        let not_found = || format!("No course found matching '{name}'");

        let Some(title) = self.index.resolve_course_name(name).await else {
            return Ok(not_found());
        };
        let Some(course) = self.index.course(&title).await else {
            return Ok(not_found());
        };

        let mut lines = vec![format!("**Course:** {}", course.title)];
        if let Some(instructor) = &course.instructor {
            lines.push(format!("**Instructor:** {instructor}"));
        }
        if let Some(link) = &course.course_link {
            lines.push(format!("**Course Link:** {link}"));
        }
        lines.push(String::new());
        lines.push(format!("**Lessons ({} total):**", course.lessons.len()));
        for lesson in &course.lessons {
            lines.push(format!("  {}. {}", lesson.lesson_number, lesson.title));
        }

        ctx.citations
            .push(SourceCitation::new(course.title.clone(), course.course_link.clone()));
        Ok(lines.join("\n"))
    }
}
