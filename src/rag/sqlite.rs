//! SQLite-backed similarity store.
//!
//! In-process vector store using SQLite for entries and brute-force cosine
//! similarity for ranking. Embeddings are stored as little-endian f32
//! blobs.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{SearchHit, StoredEntry, VectorStore};
use crate::core::config::AppPaths;
use crate::core::errors::AppError;

pub struct SqliteVectorStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, AppError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(AppError::store)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vector_entries (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(AppError::store)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_vector_entries_collection
             ON vector_entries(collection)",
        )
        .execute(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> StoredEntry {
        let metadata_str: String = row.get("metadata");
        let metadata =
            serde_json::from_str::<Value>(&metadata_str).unwrap_or(Value::Object(Default::default()));

        StoredEntry {
            id: row.get("id"),
            document: row.get("document"),
            metadata,
        }
    }

    fn matches_filters(metadata: &Value, filters: &[(String, Value)]) -> bool {
        filters
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(
        &self,
        collection: &str,
        entries: Vec<(StoredEntry, Vec<f32>)>,
    ) -> Result<(), AppError> {
        if entries.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(AppError::store)?;

        for (entry, embedding) in &entries {
            let blob = Self::serialize_embedding(embedding);
            let metadata_str = serde_json::to_string(&entry.metadata).map_err(AppError::store)?;

            sqlx::query(
                "INSERT OR REPLACE INTO vector_entries
                    (collection, id, document, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(collection)
            .bind(&entry.id)
            .bind(&entry.document)
            .bind(&metadata_str)
            .bind(&blob)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(AppError::store)?;
        }

        tx.commit().await.map_err(AppError::store)?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
        filters: &[(String, Value)],
    ) -> Result<Vec<SearchHit>, AppError> {
        let rows = sqlx::query(
            "SELECT id, document, metadata, embedding
             FROM vector_entries
             WHERE collection = ?1",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::store)?;

        let mut scored: Vec<SearchHit> = rows
            .iter()
            .filter_map(|row| {
                let entry = Self::row_to_entry(row);
                if !Self::matches_filters(&entry.metadata, filters) {
                    return None;
                }

                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(embedding, &stored);

                Some(SearchHit { entry, score })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredEntry>, AppError> {
        let row = sqlx::query(
            "SELECT id, document, metadata, embedding
             FROM vector_entries
             WHERE collection = ?1 AND id = ?2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(row.as_ref().map(Self::row_to_entry))
    }

    async fn ids(&self, collection: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            "SELECT id FROM vector_entries WHERE collection = ?1 ORDER BY created_at, id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn count(&self, collection: &str) -> Result<usize, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vector_entries WHERE collection = ?1")
                .bind(collection)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::store)?;

        Ok(count as usize)
    }

    async fn clear(&self, collection: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM vector_entries WHERE collection = ?1")
            .bind(collection)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_store() -> SqliteVectorStore {
        let tmp = std::env::temp_dir().join(format!(
            "lectern-vector-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        SqliteVectorStore::with_path(tmp).await.unwrap()
    }

    fn entry(id: &str, document: &str, metadata: Value) -> StoredEntry {
        StoredEntry {
            id: id.to_string(),
            document: document.to_string(),
            metadata,
        }
    }

    #[tokio::test]
    async fn upsert_and_query() {
        let store = test_store().await;

        store
            .upsert(
                "content",
                vec![(entry("c1", "hello world", json!({})), vec![1.0, 0.0, 0.0])],
            )
            .await
            .unwrap();

        assert_eq!(store.count("content").await.unwrap(), 1);

        let hits = store.query("content", &[1.0, 0.0, 0.0], 10, &[]).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.id, "c1");
        assert!(hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn metadata_filters_are_equality_and_conjunctive() {
        let store = test_store().await;

        store
            .upsert(
                "content",
                vec![
                    (
                        entry("a", "a", json!({"course_title": "Rust", "lesson_number": 1})),
                        vec![1.0, 0.0],
                    ),
                    (
                        entry("b", "b", json!({"course_title": "Rust", "lesson_number": 2})),
                        vec![1.0, 0.0],
                    ),
                    (
                        entry("c", "c", json!({"course_title": "Go", "lesson_number": 2})),
                        vec![1.0, 0.0],
                    ),
                ],
            )
            .await
            .unwrap();

        let filters = vec![
            ("course_title".to_string(), json!("Rust")),
            ("lesson_number".to_string(), json!(2)),
        ];
        let hits = store.query("content", &[1.0, 0.0], 10, &filters).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.id, "b");
    }

    #[tokio::test]
    async fn query_ranks_by_similarity_and_respects_k() {
        let store = test_store().await;

        store
            .upsert(
                "content",
                vec![
                    (entry("near", "near", json!({})), vec![1.0, 0.0]),
                    (entry("mid", "mid", json!({})), vec![0.7, 0.7]),
                    (entry("far", "far", json!({})), vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store.query("content", &[1.0, 0.0], 2, &[]).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.id, "near");
        assert_eq!(hits[1].entry.id, "mid");
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = test_store().await;

        store
            .upsert("catalog", vec![(entry("Rust", "Rust", json!({})), vec![1.0])])
            .await
            .unwrap();

        assert_eq!(store.count("content").await.unwrap(), 0);
        assert!(store.query("content", &[1.0], 5, &[]).await.unwrap().is_empty());
        assert_eq!(store.ids("catalog").await.unwrap(), vec!["Rust".to_string()]);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_clear_empties() {
        let store = test_store().await;

        store
            .upsert("catalog", vec![(entry("x", "old", json!({})), vec![1.0])])
            .await
            .unwrap();
        store
            .upsert("catalog", vec![(entry("x", "new", json!({})), vec![1.0])])
            .await
            .unwrap();

        assert_eq!(store.count("catalog").await.unwrap(), 1);
        let fetched = store.get("catalog", "x").await.unwrap().unwrap();
        assert_eq!(fetched.document, "new");

        store.clear("catalog").await.unwrap();
        assert_eq!(store.count("catalog").await.unwrap(), 0);
    }
}
