use async_trait::async_trait;

use super::types::{ChatMessage, ModelTurn, ToolSpec};
use crate::core::errors::AppError;

/// Completion and embedding capability used by the index and the dispatch
/// loop. Injected as a trait object so tests can script turns and embed
/// deterministically.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// provider name (e.g. "openai-compat")
    fn name(&self) -> &str;

    /// One completion over the transcript. When `tools` is `Some`, the
    /// model may answer with tool invocations instead of text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ModelTurn, AppError>;

    /// Embed each input text into a fixed-dimension vector.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError>;
}
