//! The bounded tool dispatch loop.
//!
//! Drives the back-and-forth between the completion provider and the tool
//! registry: the model either answers or requests tools; requested tools
//! run sequentially and their results join the transcript; after
//! `max_tool_rounds` rounds of tool use the model is asked once more
//! without tools, and a model that still will not answer degrades to a
//! fallback text instead of failing the request. Sources surfaced by every
//! tool call accumulate in execution order and ride along with the answer.

use std::sync::Arc;

use crate::core::errors::AppError;
use crate::llm::provider::ModelProvider;
use crate::llm::types::{ChatMessage, ModelTurn, ToolCall};
use crate::models::SourceRef;
use crate::tools::ToolRegistry;

const SYSTEM_PROMPT: &str = "\
You are an assistant for course materials and educational content, with tools for looking up course information.

Tool usage:
- `search_course_content` answers questions about specific topics, lessons, or detailed materials
- `get_course_outline` answers questions about a course's structure, syllabus, or lesson list
- Up to two rounds of tool use are available per question; prefer one focused search
- If a tool returns no results, state that clearly without offering alternatives

Answer general-knowledge questions directly without tools. Responses must be brief, accurate and directly answer what was asked; do not describe the search process or mention that results came from a search.";

const FALLBACK_ANSWER: &str =
    "I could not finish answering within the allowed number of tool calls. Please try rephrasing the question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitModel,
    ExecuteTool,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub state: LoopState,
}

pub struct AgentRuntime {
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    max_tool_rounds: usize,
}

impl AgentRuntime {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            provider,
            registry,
            max_tool_rounds,
        }
    }

    /// Answer one query, optionally continuing a prior conversation.
    pub async fn run(
        &self,
        query: &str,
        history: Option<&str>,
    ) -> Result<AgentOutcome, AppError> {
        let system = match history {
            Some(h) if !h.is_empty() => {
                format!("{}\n\nPrevious conversation:\n{}", SYSTEM_PROMPT, h)
            }
            _ => SYSTEM_PROMPT.to_string(),
        };
        let specs = self.registry.specs();

        let mut messages = vec![ChatMessage::system(system), ChatMessage::user(query)];
        let mut sources: Vec<SourceRef> = Vec::new();
        let mut pending: Vec<ToolCall> = Vec::new();
        let mut answer: Option<String> = None;
        let mut rounds = 0usize;
        let mut state = LoopState::AwaitModel;

        loop {
            match state {
                LoopState::AwaitModel => {
                    // Past the round cap the model no longer sees tools, so
                    // it is forced towards a plain answer.
                    let offer_tools = rounds < self.max_tool_rounds;
                    let turn = self
                        .provider
                        .complete(&messages, offer_tools.then_some(specs.as_slice()))
                        .await?;

                    state = match turn {
                        ModelTurn::Answer(text) => {
                            answer = Some(text);
                            LoopState::Done
                        }
                        ModelTurn::ToolUse(calls) if offer_tools => {
                            pending = calls;
                            LoopState::ExecuteTool
                        }
                        ModelTurn::ToolUse(_) => LoopState::Failed,
                    };
                }
                LoopState::ExecuteTool => {
                    messages.push(ChatMessage::assistant_tool_calls(&pending));
                    for call in pending.drain(..) {
                        let output = self.registry.dispatch(&call.name, call.arguments).await;
                        sources.extend(output.sources);
                        messages.push(ChatMessage::tool(call.id, output.content));
                    }
                    rounds += 1;
                    state = LoopState::AwaitModel;
                }
                LoopState::Done => {
                    return Ok(AgentOutcome {
                        answer: answer.unwrap_or_default(),
                        sources,
                        state,
                    });
                }
                LoopState::Failed => {
                    tracing::warn!(
                        "{}; degrading to a fallback answer after {} rounds",
                        AppError::LoopExceeded,
                        self.max_tool_rounds
                    );
                    return Ok(AgentOutcome {
                        answer: FALLBACK_ANSWER.to_string(),
                        sources,
                        state,
                    });
                }
            }
        }
    }
}
