//! The two-collection semantic index.
//!
//! The **catalog** collection holds one entry per course, keyed by the
//! canonical title and embedded from the title, so an approximate
//! user-typed course name resolves to its stored title by nearest
//! neighbour. The **content** collection holds one entry per chunk with
//! `{course_title, lesson_number, chunk_index}` metadata for filtered
//! retrieval. Every content entry's course has a catalog entry; the two
//! collections are only ever written together.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use super::store::{SearchHit, StoredEntry, VectorStore};
use crate::core::errors::AppError;
use crate::llm::provider::ModelProvider;
use crate::models::{Course, CourseChunk};

pub const CATALOG_COLLECTION: &str = "course_catalog";
pub const CONTENT_COLLECTION: &str = "course_content";

/// One ranked retrieval result.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
    pub score: f32,
}

impl ChunkMatch {
    fn from_hit(hit: SearchHit) -> Self {
        let metadata = &hit.entry.metadata;
        Self {
            content: hit.entry.document.clone(),
            course_title: metadata
                .get("course_title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            lesson_number: metadata
                .get("lesson_number")
                .and_then(Value::as_u64)
                .map(|n| n as u32),
            chunk_index: metadata
                .get("chunk_index")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32,
            score: hit.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

pub struct SemanticIndex {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn ModelProvider>,
}

impl SemanticIndex {
    pub fn new(store: Arc<dyn VectorStore>, provider: Arc<dyn ModelProvider>) -> Self {
        Self { store, provider }
    }

    pub async fn has_course(&self, title: &str) -> Result<bool, AppError> {
        Ok(self.store.get(CATALOG_COLLECTION, title).await?.is_some())
    }

    /// Index a course and its chunks.
    ///
    /// Returns `false` without touching either collection when the title is
    /// already present; call [`SemanticIndex::clear_all`] first to rebuild.
    pub async fn add_course(
        &self,
        course: &Course,
        chunks: &[CourseChunk],
    ) -> Result<bool, AppError> {
        if self.has_course(&course.title).await? {
            tracing::debug!("course '{}' already indexed, skipping", course.title);
            return Ok(false);
        }

        let title_embedding = self.embed_one(&course.title).await?;
        let catalog_entry = StoredEntry {
            id: course.title.clone(),
            document: course.title.clone(),
            metadata: serde_json::to_value(course).map_err(AppError::internal)?,
        };
        self.store
            .upsert(CATALOG_COLLECTION, vec![(catalog_entry, title_embedding)])
            .await?;

        if chunks.is_empty() {
            return Ok(true);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.provider.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::Provider(format!(
                "embedding count mismatch: {} texts, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let entry = StoredEntry {
                    id: format!(
                        "{}::{}::{}",
                        chunk.course_title, chunk.lesson_number, chunk.chunk_index
                    ),
                    document: chunk.content.clone(),
                    metadata: json!({
                        "course_title": chunk.course_title,
                        "lesson_number": chunk.lesson_number,
                        "chunk_index": chunk.chunk_index,
                    }),
                };
                (entry, embedding)
            })
            .collect();
        self.store.upsert(CONTENT_COLLECTION, entries).await?;

        Ok(true)
    }

    /// Map an approximate course name to its canonical stored title.
    ///
    /// Top-1 nearest neighbour over the catalog; `None` when the catalog is
    /// empty or nothing has any similarity to the query.
    pub async fn resolve_course_name(&self, name: &str) -> Result<Option<String>, AppError> {
        let embedding = self.embed_one(name).await?;
        let hits = self
            .store
            .query(CATALOG_COLLECTION, &embedding, 1, &[])
            .await?;

        Ok(hits
            .into_iter()
            .next()
            .filter(|hit| hit.score > f32::EPSILON)
            .map(|hit| hit.entry.id))
    }

    /// Ranked content search with optional course/lesson filters.
    ///
    /// A course filter is resolved against the catalog first and fails fast
    /// with [`AppError::Resolution`] when nothing matches; the search never
    /// silently falls back to an unfiltered query. Both filters together
    /// must both hold. An empty result set is not an error.
    pub async fn search(
        &self,
        query: &str,
        course_filter: Option<&str>,
        lesson_filter: Option<u32>,
        k: usize,
    ) -> Result<Vec<ChunkMatch>, AppError> {
        let mut filters: Vec<(String, Value)> = Vec::new();

        if let Some(name) = course_filter {
            match self.resolve_course_name(name).await? {
                Some(title) => filters.push(("course_title".to_string(), Value::String(title))),
                None => return Err(AppError::Resolution(name.to_string())),
            }
        }
        if let Some(number) = lesson_filter {
            filters.push(("lesson_number".to_string(), json!(number)));
        }

        let embedding = self.embed_one(query).await?;
        let hits = self
            .store
            .query(CONTENT_COLLECTION, &embedding, k, &filters)
            .await?;

        Ok(hits.into_iter().map(ChunkMatch::from_hit).collect())
    }

    /// Full course record for a canonical title.
    pub async fn course(&self, title: &str) -> Result<Option<Course>, AppError> {
        let Some(entry) = self.store.get(CATALOG_COLLECTION, title).await? else {
            return Ok(None);
        };
        serde_json::from_value(entry.metadata)
            .map(Some)
            .map_err(AppError::internal)
    }

    /// Resolve an approximate name and return the stored course record.
    pub async fn course_outline(&self, name: &str) -> Result<Option<Course>, AppError> {
        let Some(title) = self.resolve_course_name(name).await? else {
            return Ok(None);
        };
        self.course(&title).await
    }

    pub async fn stats(&self) -> Result<IndexStats, AppError> {
        let mut course_titles = self.store.ids(CATALOG_COLLECTION).await?;
        course_titles.sort();
        Ok(IndexStats {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.store.clear(CATALOG_COLLECTION).await?;
        self.store.clear(CONTENT_COLLECTION).await?;
        Ok(())
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.provider
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Provider("embedding service returned no vector".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{ChatMessage, ModelTurn, ToolSpec};
    use crate::rag::sqlite::SqliteVectorStore;
    use async_trait::async_trait;

    /// Deterministic bag-of-words embedder over a fixed vocabulary; shared
    /// tokens give related texts a higher cosine similarity, which is all
    /// resolution needs. Out-of-vocabulary tokens share a dedicated slot so
    /// they never overlap with real course vocabulary.
    struct ToyEmbedder;

    const VOCAB: &[&str] = &[
        "introduction", "intro", "to", "python", "advanced", "machine", "learning",
        "variables", "hold", "data", "functions", "organize", "code", "can", "return",
        "values", "neural", "networks", "learn", "anything",
    ];

    fn toy_embedding(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; VOCAB.len() + 1];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            match VOCAB.iter().position(|word| *word == token) {
                Some(i) => v[i] += 1.0,
                None => *v.last_mut().unwrap() += 1.0,
            }
        }
        v
    }

    #[async_trait]
    impl ModelProvider for ToyEmbedder {
        fn name(&self) -> &str {
            "toy-embedder"
        }

        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolSpec]>,
        ) -> Result<ModelTurn, AppError> {
            Ok(ModelTurn::Answer(String::new()))
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
            Ok(inputs.iter().map(|text| toy_embedding(text)).collect())
        }
    }

    async fn test_index() -> SemanticIndex {
        let tmp = std::env::temp_dir().join(format!(
            "lectern-index-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Arc::new(SqliteVectorStore::with_path(tmp).await.unwrap());
        SemanticIndex::new(store, Arc::new(ToyEmbedder))
    }

    fn course(title: &str) -> Course {
        Course {
            title: title.to_string(),
            link: Some(format!("https://example.com/{}", title.to_lowercase())),
            instructor: Some("Test Instructor".to_string()),
            lessons: vec![],
        }
    }

    fn chunk(title: &str, lesson: u32, index: u32, content: &str) -> CourseChunk {
        CourseChunk {
            course_title: title.to_string(),
            lesson_number: lesson,
            chunk_index: index,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn resolve_is_idempotent_on_canonical_titles() {
        let index = test_index().await;
        index
            .add_course(&course("Introduction to Python"), &[])
            .await
            .unwrap();
        index
            .add_course(&course("Advanced Machine Learning"), &[])
            .await
            .unwrap();

        let resolved = index
            .resolve_course_name("Introduction to Python")
            .await
            .unwrap();
        assert_eq!(resolved.as_deref(), Some("Introduction to Python"));
    }

    #[tokio::test]
    async fn resolve_maps_approximate_names() {
        let index = test_index().await;
        index
            .add_course(&course("Introduction to Python"), &[])
            .await
            .unwrap();
        index
            .add_course(&course("Advanced Machine Learning"), &[])
            .await
            .unwrap();

        let resolved = index.resolve_course_name("intro python").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("Introduction to Python"));
    }

    #[tokio::test]
    async fn resolve_on_empty_catalog_is_not_found() {
        let index = test_index().await;
        assert_eq!(index.resolve_course_name("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unresolved_course_filter_fails_fast() {
        let index = test_index().await;
        index
            .add_course(
                &course("Introduction to Python"),
                &[chunk("Introduction to Python", 1, 0, "variables and types")],
            )
            .await
            .unwrap();

        // Nothing shares a token with this filter, so resolution fails and
        // no unfiltered results leak out.
        let err = index
            .search("variables", Some("qqqq zzzz"), None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Resolution(_)));
    }

    #[tokio::test]
    async fn filters_combine_with_and_semantics() {
        let index = test_index().await;
        index
            .add_course(
                &course("Introduction to Python"),
                &[
                    chunk("Introduction to Python", 1, 0, "variables hold data"),
                    chunk("Introduction to Python", 2, 0, "functions organize code"),
                ],
            )
            .await
            .unwrap();
        index
            .add_course(
                &course("Advanced Machine Learning"),
                &[chunk("Advanced Machine Learning", 2, 0, "neural networks learn")],
            )
            .await
            .unwrap();

        let matches = index
            .search("code", Some("Introduction to Python"), Some(2), 10)
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].course_title, "Introduction to Python");
        assert_eq!(matches[0].lesson_number, Some(2));
    }

    #[tokio::test]
    async fn lesson_filter_returns_only_that_lesson() {
        let index = test_index().await;
        index
            .add_course(
                &course("Introduction to Python"),
                &[
                    chunk("Introduction to Python", 1, 0, "variables hold data"),
                    chunk("Introduction to Python", 2, 0, "functions organize code"),
                    chunk("Introduction to Python", 2, 1, "functions can return values"),
                ],
            )
            .await
            .unwrap();

        let matches = index.search("functions", None, Some(2), 10).await.unwrap();

        assert!(!matches.is_empty());
        assert!(matches.iter().all(|m| m.lesson_number == Some(2)));
    }

    #[tokio::test]
    async fn empty_result_set_is_not_an_error() {
        let index = test_index().await;
        index
            .add_course(
                &course("Introduction to Python"),
                &[chunk("Introduction to Python", 1, 0, "variables hold data")],
            )
            .await
            .unwrap();

        let matches = index.search("anything", None, Some(99), 10).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn reingest_without_rebuild_is_a_no_op() {
        let index = test_index().await;
        let chunks = [chunk("Introduction to Python", 1, 0, "variables hold data")];

        assert!(index
            .add_course(&course("Introduction to Python"), &chunks)
            .await
            .unwrap());
        assert!(!index
            .add_course(&course("Introduction to Python"), &chunks)
            .await
            .unwrap());

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_courses, 1);
    }

    #[tokio::test]
    async fn outline_returns_the_stored_course_record() {
        let index = test_index().await;
        let mut stored = course("Introduction to Python");
        stored.lessons = vec![
            crate::models::Lesson {
                number: 1,
                title: "Variables".to_string(),
                link: None,
            },
            crate::models::Lesson {
                number: 2,
                title: "Functions".to_string(),
                link: None,
            },
        ];
        index.add_course(&stored, &[]).await.unwrap();

        let outline = index.course_outline("intro python").await.unwrap().unwrap();
        assert_eq!(outline.title, "Introduction to Python");
        let numbers: Vec<u32> = outline.lessons.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
