use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::errors::AppError;
use crate::models::SourceRef;
use crate::rag::index::IndexStats;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub session_id: String,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    let outcome = state.assistant.answer(query, request.session_id).await?;
    Ok(Json(QueryResponse {
        answer: outcome.answer,
        sources: outcome.sources,
        session_id: outcome.session_id,
    }))
}

pub async fn courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IndexStats>, AppError> {
    Ok(Json(state.assistant.stats().await?))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
