pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiCompatProvider;
pub use provider::ModelProvider;
pub use types::{ChatMessage, ModelTurn, ToolCall, ToolSpec};
