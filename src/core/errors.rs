use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy for the retrieval and orchestration pipeline.
///
/// `Resolution`, `ToolExecution` and `LoopExceeded` are degraded into
/// informative text before they reach an HTTP caller; the remaining
/// variants surface as JSON error responses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("malformed course document: {0}")]
    Parse(String),
    #[error("No course found matching '{0}'")]
    Resolution(String),
    #[error("tool execution failed: {0}")]
    ToolExecution(String),
    #[error("tool round limit reached without a final answer")]
    LoopExceeded,
    #[error("config error: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("model provider error: {0}")]
    Provider(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        AppError::Store(err.to_string())
    }

    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        AppError::Provider(err.to_string())
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Resolution(_) => StatusCode::NOT_FOUND,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::ToolExecution(_)
            | AppError::LoopExceeded
            | AppError::Config(_)
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
