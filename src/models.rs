//! Domain records shared across ingestion, indexing and retrieval.

use serde::{Deserialize, Serialize};

/// One course document, keyed by its title.
///
/// Courses are immutable once ingested; re-ingesting a known title is a
/// no-op unless a rebuild was requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.number == number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// A contiguous span of lesson text, the unit of semantic retrieval.
///
/// Chunk indices are gapless from 0 within each lesson. Chunks are derived
/// from the document and replaced wholesale when the course is re-ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub course_title: String,
    pub lesson_number: u32,
    pub chunk_index: u32,
    pub content: String,
}

/// Attribution for one retrieved result, shown to the end user alongside
/// the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub course_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
    /// Display label, e.g. "Intro to Rust - Lesson 2".
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}
