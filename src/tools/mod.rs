//! Locally executed capabilities offered to the model.
//!
//! Tools form a closed registry dispatched by name. A handler failure is
//! converted into a descriptive tool-result string so the model can see
//! what went wrong and self-correct; it is never surfaced as a fault.

mod outline;
mod search;

pub use outline::{CourseOutlineTool, OUTLINE_TOOL_NAME};
pub use search::{CourseSearchTool, SEARCH_TOOL_NAME};

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::{json, Value};

use crate::core::errors::AppError;
use crate::llm::types::ToolSpec;
use crate::models::SourceRef;

/// Result of one tool invocation. `sources` is rebuilt from scratch on
/// every call; nothing carries over from earlier invocations.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<SourceRef>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    /// Declared name, description and argument schema offered to the model.
    fn spec(&self) -> ToolSpec;

    async fn execute(&self, args: Value) -> Result<ToolOutput, AppError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec()).collect()
    }

    /// Execute a tool by name. Unknown names and handler errors come back
    /// as tool-result text, never as `Err`.
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolOutput {
        let Some(tool) = self.tools.iter().find(|tool| tool.name() == name) else {
            return ToolOutput::text(format!("Unknown tool: {}", name));
        };

        match tool.execute(args).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!("Tool '{}' failed: {}", name, err);
                ToolOutput::text(format!("Tool '{}' failed: {}", name, err))
            }
        }
    }
}

/// JSON schema for a tool argument struct.
pub(crate) fn input_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({"type": "object"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo".to_string(),
                description: "Echo the input back.".to_string(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn execute(&self, args: Value) -> Result<ToolOutput, AppError> {
            Ok(ToolOutput::text(args.to_string()))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "broken".to_string(),
                description: "Always fails.".to_string(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn execute(&self, _args: Value) -> Result<ToolOutput, AppError> {
            Err(AppError::ToolExecution("database exploded".to_string()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[tokio::test]
    async fn dispatch_routes_by_name() {
        let output = registry().dispatch("echo", json!({"x": 1})).await;
        assert!(output.content.contains("\"x\":1"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_result_text() {
        let output = registry().dispatch("nope", json!({})).await;
        assert_eq!(output.content, "Unknown tool: nope");
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn handler_failure_becomes_result_text() {
        let output = registry().dispatch("broken", json!({})).await;
        assert!(output.content.contains("database exploded"));
        assert!(output.sources.is_empty());
    }

    #[test]
    fn specs_cover_all_registered_tools() {
        let names: Vec<String> = registry().specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["echo".to_string(), "broken".to_string()]);
    }
}
