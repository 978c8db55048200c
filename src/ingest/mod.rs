//! Course document parsing and sentence-aware chunking.
//!
//! A course file looks like:
//!
//! ```text
//! Course Title: Building Towards Computer Use with Anthropic
//! Course Link: https://example.com/computer-use
//! Course Instructor: Colt Steele
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/computer-use/0
//! Welcome to the course. ...
//! ```

mod loader;

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SyllabusError};

pub use loader::{index_course_file, index_course_folder};

/// A course and its lesson list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub title: String,
    pub course_link: Option<String>,
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course_link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_number == number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    pub lesson_number: u32,
    pub title: String,
    pub lesson_link: Option<String>,
}

/// A searchable slice of course text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    /// Position within the course, consecutive across lessons.
    pub chunk_index: usize,
}

/// Extensions picked up when loading a folder.
pub const COURSE_FILE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Parse one course document into its metadata and chunks.
pub fn parse_course_document(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<(Course, Vec<CourseChunk>)> {
    DocumentParser::new(chunk_size, overlap)?.parse(text)
}

/// Read and parse a course file.
pub fn read_course_file(
    path: &Path,
    chunk_size: usize,
    overlap: usize,
) -> Result<(Course, Vec<CourseChunk>)> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SyllabusError::Ingestion(format!("{}: {e}", path.display())))?;
    let parsed = parse_course_document(&text, chunk_size, overlap)?;
    debug!(path = %path.display(), chunks = parsed.1.len(), "parsed course file");
    Ok(parsed)
}

/// Course files directly inside `dir`, sorted by name.
pub fn course_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        COURSE_FILE_EXTENSIONS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    })
        })
        .collect();
    files.sort();
    Ok(files)
}

struct DocumentParser {
    chunker: SentenceChunker,
    lesson_marker: Regex,
}

impl DocumentParser {
    fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Ok(Self {
            chunker: SentenceChunker::new(chunk_size, overlap)?,
            lesson_marker: compile(r"(?i)^lesson\s+(\d+)\s*:\s*(.*)$")?,
        })
    }

    fn parse(&self, text: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let lines: Vec<&str> = text.lines().collect();
        let mut course = Course::new("");
        let mut body_start = 0;

        for (idx, line) in lines.iter().enumerate().take(4) {
            let line = line.trim();
            if let Some(title) = header_value(line, "Course Title:") {
                course.title = title.to_string();
            } else if let Some(link) = header_value(line, "Course Link:") {
                course.course_link = non_empty(link);
            } else if let Some(instructor) = header_value(line, "Course Instructor:") {
                course.instructor = non_empty(instructor);
            } else if idx == 0 {
                course.title = line.to_string();
            } else {
                continue;
            }
            body_start = idx + 1;
        }

        if course.title.is_empty() {
            return Err(SyllabusError::Ingestion("document has no course title".into()));
        }

        let mut chunks = Vec::new();
        let mut current: Option<Lesson> = None;
        let mut buffer: Vec<&str> = Vec::new();
        let mut saw_marker = false;

        let mut iter = lines[body_start..].iter().map(|l| l.trim_end()).peekable();
        while let Some(line) = iter.next() {
            let Some(caps) = self.lesson_marker.captures(line.trim()) else {
                buffer.push(line);
                continue;
            };

            self.flush(current.take(), &buffer, &mut course, &mut chunks, true);
            buffer.clear();
            saw_marker = true;

            let lesson_number = caps[1]
                .parse()
                .map_err(|_| SyllabusError::Ingestion(format!("bad lesson number in '{line}'")))?;
            let mut lesson = Lesson {
                lesson_number,
                title: caps[2].trim().to_string(),
                lesson_link: None,
            };
            if let Some(link) = iter
                .peek()
                .copied()
                .and_then(|next| header_value(next.trim(), "Lesson Link:"))
            {
                lesson.lesson_link = non_empty(link);
                iter.next();
            }
            current = Some(lesson);
        }
        self.flush(current.take(), &buffer, &mut course, &mut chunks, saw_marker);

        Ok((course, chunks))
    }

    // Text outside any lesson is only kept when the document has no markers.
    fn flush(
        &self,
        lesson: Option<Lesson>,
        buffer: &[&str],
        course: &mut Course,
        chunks: &mut Vec<CourseChunk>,
        has_markers: bool,
    ) {
        let content = buffer.join("\n");
        let content = content.trim();

        let lesson_number = lesson.as_ref().map(|l| l.lesson_number);
        if let Some(lesson) = lesson {
            course.lessons.push(lesson);
        } else if has_markers {
            return;
        }
        if content.is_empty() {
            return;
        }

        let title = course.title.as_str();
        let prefix = match lesson_number {
            Some(n) => format!("Course {title} Lesson {n} content: "),
            None => format!("Course {title} content: "),
        };
        for piece in self.chunker.chunk(content) {
            chunks.push(CourseChunk {
                content: format!("{prefix}{piece}"),
                course_title: title.to_string(),
                lesson_number,
                chunk_index: chunks.len(),
            });
        }
    }
}

/// Greedy sentence packer with trailing-sentence overlap.
pub struct SentenceChunker {
    chunk_size: usize,
    overlap: usize,
    sentence_end: Regex,
}

impl SentenceChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(SyllabusError::Configuration(format!(
                "invalid chunking: size {chunk_size}, overlap {overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            sentence_end: compile(r#"[.!?]+["')\]]*\s+"#)?,
        })
    }

    /// Split on sentence boundaries, collapsing whitespace inside sentences.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.sentence_end.find_iter(text) {
            push_sentence(&mut sentences, &text[start..m.end()]);
            start = m.end();
        }
        push_sentence(&mut sentences, &text[start..]);
        sentences
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = self.sentences(text);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < sentences.len() {
            let mut size = 0;
            let mut end = start;
            while end < sentences.len() {
                let len = char_len(&sentences[end]) + usize::from(end > start);
                if end > start && size + len > self.chunk_size {
                    break;
                }
                size += len;
                end += 1;
            }

            chunks.push(sentences[start..end].join(" "));
            if end == sentences.len() {
                break;
            }

            let mut carried = 0;
            let mut carried_len = 0;
            for sentence in sentences[start..end].iter().rev() {
                let len = char_len(sentence) + usize::from(carried > 0);
                if carried_len + len > self.overlap {
                    break;
                }
                carried_len += len;
                carried += 1;
            }
            start = (end - carried).max(start + 1);
        }

        chunks
    }
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn header_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    head.eq_ignore_ascii_case(label)
        .then(|| line[label.len()..].trim())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SyllabusError::Ingestion(format!("bad pattern {pattern}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "Course Title: Intro to MCP
Course Link: https://example.com/mcp
Course Instructor: Elie Schoppik

Lesson 0: Introduction
Lesson Link: https://example.com/mcp/0
MCP connects models to tools. It is an open protocol.

Lesson 1: Architecture
Clients talk to servers. Servers expose tools!
";

    #[test]
    fn parses_headers_and_lessons() {
        let (course, chunks) = parse_course_document(DOC, 800, 100).unwrap();

        assert_eq!(course.title, "Intro to MCP");
        assert_eq!(course.course_link.as_deref(), Some("https://example.com/mcp"));
        assert_eq!(course.instructor.as_deref(), Some("Elie Schoppik"));
        assert_eq!(
            course.lessons,
            vec![
                Lesson {
                    lesson_number: 0,
                    title: "Introduction".into(),
                    lesson_link: Some("https://example.com/mcp/0".into()),
                },
                Lesson {
                    lesson_number: 1,
                    title: "Architecture".into(),
                    lesson_link: None,
                },
            ]
        );

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].content,
            "Course Intro to MCP Lesson 0 content: MCP connects models to tools. It is an open protocol."
        );
        assert_eq!(chunks[1].lesson_number, Some(1));
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[test]
    fn document_without_markers_is_lessonless() {
        let (course, chunks) =
            parse_course_document("Plain Notes\nSome text here. More text.", 800, 100).unwrap();
        assert_eq!(course.title, "Plain Notes");
        assert!(course.lessons.is_empty());
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].content,
            "Course Plain Notes content: Some text here. More text."
        );
        assert_eq!(chunks[0].lesson_number, None);
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(matches!(
            parse_course_document("", 800, 100),
            Err(SyllabusError::Ingestion(_))
        ));
    }

    #[test]
    fn chunks_respect_size_and_carry_overlap() {
        let chunker = SentenceChunker::new(40, 20).unwrap();
        let chunks = chunker.chunk("Alpha beta gamma. Delta epsilon. Zeta eta theta. Iota kappa.");

        assert_eq!(
            chunks,
            vec![
                "Alpha beta gamma. Delta epsilon.",
                "Delta epsilon. Zeta eta theta.",
                "Zeta eta theta. Iota kappa.",
            ]
        );
    }

    #[test]
    fn oversized_sentence_still_progresses() {
        let chunker = SentenceChunker::new(10, 5).unwrap();
        let chunks = chunker.chunk("This sentence is far too long. Short.");
        assert_eq!(chunks, vec!["This sentence is far too long.", "Short."]);
    }

    #[test]
    fn invalid_chunk_settings_fail() {
        assert!(SentenceChunker::new(0, 0).is_err());
        assert!(SentenceChunker::new(100, 100).is_err());
    }

    #[test]
    fn folder_listing_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "x").unwrap();

        let names: Vec<String> = course_files(dir.path())
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
    }
}
