mod runtime;

pub use runtime::{AgentOutcome, AgentRuntime, LoopState};
