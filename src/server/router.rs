use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers;
use crate::state::AppState;

/// The application router: the query entry point, course stats for the UI
/// and a health check, behind CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/query", post(handlers::query))
        .route("/api/courses", get(handlers::courses))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
