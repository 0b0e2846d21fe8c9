use anyhow::Context;
use tokio::net::TcpListener;

use lectern_backend::core::config::{load_config, AppPaths};
use lectern_backend::logging;
use lectern_backend::server::router::router;
use lectern_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let config = load_config(&paths)?;
    let state = AppState::initialize(&paths, config).await?;

    // Ingestion runs to completion before the listener opens, so a query
    // can never observe a partially indexed course.
    let docs_dir = paths.project_root.join(&state.config.ingest.docs_dir);
    if docs_dir.is_dir() {
        let report = state
            .assistant
            .ingest_folder(&docs_dir, state.config.ingest.rebuild_on_start)
            .await?;
        tracing::info!(
            "Ingested {} courses ({} chunks), skipped {} known, rejected {} documents",
            report.courses_added,
            report.chunks_added,
            report.courses_skipped,
            report.documents_rejected
        );
    } else {
        tracing::warn!(
            "Docs directory {} not found; starting with whatever the index already holds",
            docs_dir.display()
        );
    }

    let bind_addr = format!("127.0.0.1:{}", state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await.context("Server error")?;

    Ok(())
}
