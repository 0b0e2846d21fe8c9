//! The assistant facade: startup ingestion plus per-query orchestration.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::agent::AgentRuntime;
use crate::core::config::IngestConfig;
use crate::core::errors::AppError;
use crate::ingest::parse_course_document;
use crate::models::SourceRef;
use crate::rag::index::{IndexStats, SemanticIndex};
use crate::session::SessionStore;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub courses_added: usize,
    pub chunks_added: usize,
    pub courses_skipped: usize,
    pub documents_rejected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub session_id: String,
}

pub struct CourseAssistant {
    ingest: IngestConfig,
    index: Arc<SemanticIndex>,
    sessions: Arc<SessionStore>,
    runtime: AgentRuntime,
}

impl CourseAssistant {
    pub fn new(
        ingest: IngestConfig,
        index: Arc<SemanticIndex>,
        sessions: Arc<SessionStore>,
        runtime: AgentRuntime,
    ) -> Self {
        Self {
            ingest,
            index,
            sessions,
            runtime,
        }
    }

    /// Ingest every `.txt` course document in a folder.
    ///
    /// A document that fails to parse is rejected whole and logged; the
    /// remaining documents are unaffected. Already-indexed titles are
    /// skipped unless `rebuild` clears the index first.
    pub async fn ingest_folder(
        &self,
        dir: &Path,
        rebuild: bool,
    ) -> Result<IngestReport, AppError> {
        if rebuild {
            self.index.clear_all().await?;
        }

        let entries = std::fs::read_dir(dir).map_err(|e| {
            AppError::Internal(format!("cannot read docs dir {}: {}", dir.display(), e))
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("txt"))
            .collect();
        paths.sort();

        let mut report = IngestReport::default();
        for path in paths {
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.documents_rejected += 1;
                    continue;
                }
            };

            let parsed = match parse_course_document(&raw, &self.ingest) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Rejecting {}: {}", path.display(), e);
                    report.documents_rejected += 1;
                    continue;
                }
            };

            if self.index.add_course(&parsed.course, &parsed.chunks).await? {
                tracing::info!(
                    "Indexed course '{}' ({} chunks)",
                    parsed.course.title,
                    parsed.chunks.len()
                );
                report.courses_added += 1;
                report.chunks_added += parsed.chunks.len();
            } else {
                report.courses_skipped += 1;
            }
        }

        Ok(report)
    }

    /// Answer one query in the context of a session, recording the
    /// exchange afterwards. A missing session id starts a fresh session.
    pub async fn answer(
        &self,
        query: &str,
        session_id: Option<String>,
    ) -> Result<AnswerOutcome, AppError> {
        let session_id = session_id.unwrap_or_else(|| self.sessions.create_session());
        let history = self.sessions.get_history(&session_id);

        let outcome = self.runtime.run(query, history.as_deref()).await?;
        self.sessions.add_exchange(&session_id, query, &outcome.answer);

        Ok(AnswerOutcome {
            answer: outcome.answer,
            sources: outcome.sources,
            session_id,
        })
    }

    pub async fn stats(&self) -> Result<IndexStats, AppError> {
        self.index.stats().await
    }
}
