use std::sync::Arc;

use crate::agent::AgentRuntime;
use crate::assistant::CourseAssistant;
use crate::core::config::{AppConfig, AppPaths};
use crate::core::errors::AppError;
use crate::llm::{ModelProvider, OpenAiCompatProvider};
use crate::rag::index::SemanticIndex;
use crate::rag::sqlite::SqliteVectorStore;
use crate::rag::store::VectorStore;
use crate::session::SessionStore;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolRegistry};

/// Shared application state: configuration plus the fully wired assistant.
///
/// Every collaborator (similarity store, completion provider, tool
/// registry, session store) is built here and injected, so alternative
/// implementations can be substituted without touching the pipeline.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub assistant: Arc<CourseAssistant>,
}

impl AppState {
    pub async fn initialize(paths: &AppPaths, config: AppConfig) -> Result<Arc<Self>, AppError> {
        let provider: Arc<dyn ModelProvider> =
            Arc::new(OpenAiCompatProvider::new(config.provider.clone())?);
        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(paths).await?);
        let index = Arc::new(SemanticIndex::new(store, provider.clone()));
        let sessions = Arc::new(SessionStore::new(config.session.max_history));

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(
            index.clone(),
            config.agent.max_results,
        )));
        registry.register(Arc::new(CourseOutlineTool::new(index.clone())));

        let runtime = AgentRuntime::new(provider, Arc::new(registry), config.agent.max_tool_rounds);
        let assistant = Arc::new(CourseAssistant::new(
            config.ingest.clone(),
            index,
            sessions,
            runtime,
        ));

        Ok(Arc::new(AppState { config, assistant }))
    }
}
