//! The course outline tool.
//!
//! Answers syllabus-shaped questions from the catalog alone: course title,
//! course link and the numbered lesson list.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{input_schema, Tool, ToolOutput};
use crate::core::errors::AppError;
use crate::llm::types::ToolSpec;
use crate::models::{Course, SourceRef};
use crate::rag::index::SemanticIndex;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OutlineArgs {
    /// Course title to look up (approximate names are resolved).
    pub course_name: String,
}

pub struct CourseOutlineTool {
    index: Arc<SemanticIndex>,
}

impl CourseOutlineTool {
    pub fn new(index: Arc<SemanticIndex>) -> Self {
        Self { index }
    }

    fn format_outline(course: &Course) -> ToolOutput {
        let mut content = format!("Course: {}", course.title);
        if let Some(link) = &course.link {
            let _ = write!(content, "\nLink: {}", link);
        }
        if let Some(instructor) = &course.instructor {
            let _ = write!(content, "\nInstructor: {}", instructor);
        }
        if course.lessons.is_empty() {
            content.push_str("\nNo lessons listed.");
        } else {
            content.push_str("\nLessons:");
            for lesson in &course.lessons {
                let _ = write!(content, "\n{}. {}", lesson.number, lesson.title);
            }
        }

        ToolOutput {
            content,
            sources: vec![SourceRef {
                course_title: course.title.clone(),
                lesson_number: None,
                label: course.title.clone(),
                link: course.link.clone(),
            }],
        }
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &'static str {
        OUTLINE_TOOL_NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get a course's outline: title, link and the numbered lesson list."
                .to_string(),
            parameters: input_schema::<OutlineArgs>(),
        }
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, AppError> {
        let args: OutlineArgs = serde_json::from_value(args)
            .map_err(|e| AppError::ToolExecution(format!("invalid outline arguments: {}", e)))?;

        match self.index.course_outline(&args.course_name).await? {
            Some(course) => Ok(Self::format_outline(&course)),
            None => Ok(ToolOutput::text(
                AppError::Resolution(args.course_name).to_string(),
            )),
        }
    }
}
