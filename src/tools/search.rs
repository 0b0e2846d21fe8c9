//! The course content search tool.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{input_schema, Tool, ToolOutput};
use crate::core::errors::AppError;
use crate::llm::types::ToolSpec;
use crate::models::{Course, SourceRef};
use crate::rag::index::{ChunkMatch, SemanticIndex};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// What to look for in the course materials.
    pub query: String,
    /// Course title to search in (approximate names are resolved).
    #[serde(default)]
    pub course_name: Option<String>,
    /// Restrict the search to one lesson of the course.
    #[serde(default)]
    pub lesson_number: Option<u32>,
}

pub struct CourseSearchTool {
    index: Arc<SemanticIndex>,
    max_results: usize,
}

impl CourseSearchTool {
    pub fn new(index: Arc<SemanticIndex>, max_results: usize) -> Self {
        Self { index, max_results }
    }

    fn empty_message(args: &SearchArgs) -> String {
        let mut message = String::from("No relevant content found");
        if let Some(course) = &args.course_name {
            message.push_str(&format!(" in course '{}'", course));
        }
        if let Some(lesson) = args.lesson_number {
            message.push_str(&format!(" in lesson {}", lesson));
        }
        message.push('.');
        message
    }

    async fn outlines_for(
        &self,
        matches: &[ChunkMatch],
    ) -> Result<HashMap<String, Course>, AppError> {
        let mut outlines = HashMap::new();
        for m in matches {
            if !outlines.contains_key(&m.course_title) {
                if let Some(course) = self.index.course(&m.course_title).await? {
                    outlines.insert(m.course_title.clone(), course);
                }
            }
        }
        Ok(outlines)
    }

    fn format_results(matches: &[ChunkMatch], outlines: &HashMap<String, Course>) -> ToolOutput {
        let mut blocks = Vec::with_capacity(matches.len());
        let mut sources = Vec::with_capacity(matches.len());

        for m in matches {
            let label = match m.lesson_number {
                Some(lesson) => format!("{} - Lesson {}", m.course_title, lesson),
                None => m.course_title.clone(),
            };
            blocks.push(format!("[{}]\n{}", label, m.content));

            let link = outlines.get(&m.course_title).and_then(|course| {
                m.lesson_number
                    .and_then(|n| course.lesson(n))
                    .and_then(|lesson| lesson.link.clone())
                    .or_else(|| course.link.clone())
            });
            sources.push(SourceRef {
                course_title: m.course_title.clone(),
                lesson_number: m.lesson_number,
                label,
                link,
            });
        }

        ToolOutput {
            content: blocks.join("\n\n"),
            sources,
        }
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &'static str {
        SEARCH_TOOL_NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: SEARCH_TOOL_NAME.to_string(),
            description:
                "Search course materials with smart course name matching and lesson filtering."
                    .to_string(),
            parameters: input_schema::<SearchArgs>(),
        }
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, AppError> {
        let args: SearchArgs = serde_json::from_value(args)
            .map_err(|e| AppError::ToolExecution(format!("invalid search arguments: {}", e)))?;

        let matches = match self
            .index
            .search(
                &args.query,
                args.course_name.as_deref(),
                args.lesson_number,
                self.max_results,
            )
            .await
        {
            Ok(matches) => matches,
            // An unmatched course filter is an answer, not a fault: the
            // model should see it and acknowledge the gap.
            Err(err @ AppError::Resolution(_)) => return Ok(ToolOutput::text(err.to_string())),
            Err(err) => return Err(err),
        };

        if matches.is_empty() {
            return Ok(ToolOutput::text(Self::empty_message(&args)));
        }

        let outlines = self.outlines_for(&matches).await?;
        Ok(Self::format_results(&matches, &outlines))
    }
}
