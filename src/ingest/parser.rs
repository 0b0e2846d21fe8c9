//! Structured course document parsing.
//!
//! A course document starts with a header (`Course Title:`, `Course Link:`,
//! `Course Instructor:` in that order), followed by lesson sections opened
//! by `Lesson N: Title` markers. A marker may be followed by a
//! `Lesson Link:` line. Text between the header and the first marker is
//! handled by the configured [`PreamblePolicy`]: kept as a synthetic
//! lesson 0 titled "Overview", or dropped.
//!
//! A document missing its title is rejected as a whole; nothing partial is
//! produced.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::config::{IngestConfig, PreamblePolicy};
use crate::core::errors::AppError;
use crate::ingest::chunker::split_into_chunks;
use crate::models::{Course, CourseChunk, Lesson};

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub course: Course,
    pub chunks: Vec<CourseChunk>,
}

const TITLE_PREFIX: &str = "Course Title:";
const LINK_PREFIX: &str = "Course Link:";
const INSTRUCTOR_PREFIX: &str = "Course Instructor:";
const LESSON_LINK_PREFIX: &str = "Lesson Link:";

fn lesson_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Lesson\s+(\d+):\s*(.*)$").expect("lesson marker pattern"))
}

struct RawLesson {
    number: u32,
    title: String,
    link: Option<String>,
    body: Vec<String>,
}

pub fn parse_course_document(
    raw: &str,
    config: &IngestConfig,
) -> Result<ParsedDocument, AppError> {
    let lines: Vec<&str> = raw.lines().collect();

    let mut title: Option<String> = None;
    let mut link: Option<String> = None;
    let mut instructor: Option<String> = None;

    // Header: prefixed lines up to the first line that is neither blank
    // nor a header field.
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }
        if let Some(value) = strip_prefixed(line, TITLE_PREFIX) {
            title.get_or_insert(value);
        } else if let Some(value) = strip_prefixed(line, LINK_PREFIX) {
            link.get_or_insert(value);
        } else if let Some(value) = strip_prefixed(line, INSTRUCTOR_PREFIX) {
            instructor.get_or_insert(value);
        } else {
            break;
        }
        i += 1;
    }

    let title = title.ok_or_else(|| AppError::Parse("missing course title".to_string()))?;

    let mut preamble: Vec<String> = Vec::new();
    let mut lessons: Vec<RawLesson> = Vec::new();
    let mut expecting_link = false;

    for line in &lines[i..] {
        if let Some(caps) = lesson_marker().captures(line.trim()) {
            if let Ok(number) = caps[1].parse::<u32>() {
                lessons.push(RawLesson {
                    number,
                    title: caps[2].trim().to_string(),
                    link: None,
                    body: Vec::new(),
                });
                expecting_link = true;
                continue;
            }
        }

        if expecting_link {
            let trimmed = line.trim();
            if let Some(value) = strip_prefixed(trimmed, LESSON_LINK_PREFIX) {
                if let Some(current) = lessons.last_mut() {
                    current.link = Some(value);
                }
                expecting_link = false;
                continue;
            }
            if !trimmed.is_empty() {
                expecting_link = false;
            }
        }

        match lessons.last_mut() {
            Some(current) => current.body.push((*line).to_string()),
            None => preamble.push((*line).to_string()),
        }
    }

    let mut lessons = merge_duplicate_numbers(lessons);
    attach_preamble(&mut lessons, preamble, config.preamble, &title);

    let mut course = Course {
        title,
        link,
        instructor,
        lessons: Vec::with_capacity(lessons.len()),
    };
    let mut chunks = Vec::new();

    for lesson in &lessons {
        course.lessons.push(Lesson {
            number: lesson.number,
            title: lesson.title.clone(),
            link: lesson.link.clone(),
        });

        let body = lesson.body.join("\n").trim().to_string();
        if body.is_empty() {
            continue;
        }

        for (idx, piece) in split_into_chunks(&body, config.chunk_size, config.chunk_overlap)
            .into_iter()
            .enumerate()
        {
            let content = if idx == 0 {
                format!(
                    "Course {} Lesson {} content: {}",
                    course.title, lesson.number, piece
                )
            } else {
                piece
            };
            chunks.push(CourseChunk {
                course_title: course.title.clone(),
                lesson_number: lesson.number,
                chunk_index: idx as u32,
                content,
            });
        }
    }

    Ok(ParsedDocument { course, chunks })
}

fn strip_prefixed(line: &str, prefix: &str) -> Option<String> {
    line.strip_prefix(prefix)
        .map(|rest| rest.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// A repeated lesson number would break per-lesson chunk numbering, so
/// later sections with a seen number are appended to the first one.
fn merge_duplicate_numbers(lessons: Vec<RawLesson>) -> Vec<RawLesson> {
    let mut merged: Vec<RawLesson> = Vec::with_capacity(lessons.len());
    for lesson in lessons {
        match merged.iter_mut().find(|seen| seen.number == lesson.number) {
            Some(seen) => seen.body.extend(lesson.body),
            None => merged.push(lesson),
        }
    }
    merged
}

fn attach_preamble(
    lessons: &mut Vec<RawLesson>,
    preamble: Vec<String>,
    policy: PreamblePolicy,
    course_title: &str,
) {
    if preamble.iter().all(|line| line.trim().is_empty()) {
        return;
    }

    match policy {
        PreamblePolicy::Drop => {
            tracing::debug!(
                "dropping {} preamble lines of course '{}'",
                preamble.len(),
                course_title
            );
        }
        PreamblePolicy::LessonZero => {
            match lessons.iter_mut().find(|lesson| lesson.number == 0) {
                // An explicit lesson 0 absorbs the preamble so lesson
                // numbers stay unique.
                Some(zero) => {
                    zero.body.splice(0..0, preamble);
                }
                None => {
                    lessons.insert(
                        0,
                        RawLesson {
                            number: 0,
                            title: "Overview".to_string(),
                            link: None,
                            body: preamble,
                        },
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IngestConfig {
        IngestConfig::default()
    }

    const DOC: &str = "\
Course Title: Intro to Rust
Course Link: https://example.com/rust
Course Instructor: Ada Lovelace

Lesson 1: Ownership
Lesson Link: https://example.com/rust/1
Ownership is the core idea. Every value has a single owner.

Lesson 2: Borrowing
References let you use a value without taking ownership.
";

    #[test]
    fn parses_header_and_lessons() {
        let parsed = parse_course_document(DOC, &config()).unwrap();

        assert_eq!(parsed.course.title, "Intro to Rust");
        assert_eq!(parsed.course.link.as_deref(), Some("https://example.com/rust"));
        assert_eq!(parsed.course.instructor.as_deref(), Some("Ada Lovelace"));
        assert_eq!(parsed.course.lessons.len(), 2);
        assert_eq!(parsed.course.lessons[0].number, 1);
        assert_eq!(
            parsed.course.lessons[0].link.as_deref(),
            Some("https://example.com/rust/1")
        );
        assert_eq!(parsed.course.lessons[1].link, None);
    }

    #[test]
    fn first_chunk_of_each_lesson_carries_context_label() {
        let parsed = parse_course_document(DOC, &config()).unwrap();

        let lesson_two: Vec<_> = parsed
            .chunks
            .iter()
            .filter(|chunk| chunk.lesson_number == 2)
            .collect();
        assert!(!lesson_two.is_empty());
        assert!(lesson_two[0]
            .content
            .starts_with("Course Intro to Rust Lesson 2 content:"));
    }

    #[test]
    fn missing_title_rejects_the_whole_document() {
        let doc = "Course Link: https://example.com\n\nLesson 1: A\nbody\n";
        let err = parse_course_document(doc, &config()).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert!(err.to_string().contains("course title"));
    }

    #[test]
    fn empty_lesson_body_yields_no_chunks_for_that_lesson() {
        let doc = "\
Course Title: Sparse
Lesson 1: Placeholder

Lesson 2: Real
Actual content here.
";
        let parsed = parse_course_document(doc, &config()).unwrap();

        assert_eq!(parsed.course.lessons.len(), 2);
        assert!(parsed.chunks.iter().all(|chunk| chunk.lesson_number == 2));
    }

    #[test]
    fn chunk_indices_are_gapless_per_lesson() {
        let long_body = format!("{}. ", "word".repeat(20)).repeat(40);
        let doc = format!(
            "Course Title: Long\nLesson 1: Big\n{}\nLesson 2: Small\nshort body\n",
            long_body
        );
        let parsed = parse_course_document(&doc, &config()).unwrap();

        for lesson in [1u32, 2] {
            let mut indices: Vec<u32> = parsed
                .chunks
                .iter()
                .filter(|chunk| chunk.lesson_number == lesson)
                .map(|chunk| chunk.chunk_index)
                .collect();
            indices.sort_unstable();
            let expected: Vec<u32> = (0..indices.len() as u32).collect();
            assert_eq!(indices, expected);
        }
    }

    #[test]
    fn preamble_becomes_synthetic_lesson_zero_by_default() {
        let doc = "\
Course Title: Prefaced
This text sits before any lesson marker.

Lesson 1: First
Lesson one body.
";
        let parsed = parse_course_document(doc, &config()).unwrap();

        assert_eq!(parsed.course.lessons[0].number, 0);
        assert_eq!(parsed.course.lessons[0].title, "Overview");
        let zero: Vec<_> = parsed
            .chunks
            .iter()
            .filter(|chunk| chunk.lesson_number == 0)
            .collect();
        assert_eq!(zero.len(), 1);
        assert!(zero[0].content.contains("before any lesson marker"));
    }

    #[test]
    fn preamble_is_discarded_under_drop_policy() {
        let mut cfg = config();
        cfg.preamble = PreamblePolicy::Drop;

        let doc = "\
Course Title: Prefaced
This text sits before any lesson marker.

Lesson 1: First
Lesson one body.
";
        let parsed = parse_course_document(doc, &cfg).unwrap();

        assert!(parsed.chunks.iter().all(|chunk| chunk.lesson_number == 1));
        assert!(parsed.course.lessons.iter().all(|lesson| lesson.number == 1));
    }

    #[test]
    fn preamble_merges_into_explicit_lesson_zero() {
        let doc = "\
Course Title: Prefaced
Welcome text.

Lesson 0: Introduction
Marked introduction body.
";
        let parsed = parse_course_document(doc, &config()).unwrap();

        assert_eq!(parsed.course.lessons.len(), 1);
        let zero: Vec<_> = parsed
            .chunks
            .iter()
            .filter(|chunk| chunk.lesson_number == 0)
            .collect();
        assert_eq!(zero.len(), 1);
        assert!(zero[0].content.contains("Welcome text."));
        assert!(zero[0].content.contains("Marked introduction body."));
    }
}
