//! VectorStore trait — abstract interface for similarity-store backends.
//!
//! Entries live in named collections and carry a text document, JSON
//! metadata and an embedding vector. The primary implementation is
//! `SqliteVectorStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::AppError;

/// A stored entry without its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Unique within a collection.
    pub id: String,
    /// The text the embedding was derived from.
    pub document: String,
    /// JSON object used for equality filtering.
    pub metadata: Value,
}

/// One ranked similarity match.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub entry: StoredEntry,
    /// Cosine similarity (higher = closer).
    pub score: f32,
}

/// Abstract trait for similarity-store backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace entries with their embedding vectors.
    async fn upsert(
        &self,
        collection: &str,
        entries: Vec<(StoredEntry, Vec<f32>)>,
    ) -> Result<(), AppError>;

    /// Nearest neighbours of `embedding`, restricted to entries whose
    /// metadata matches every `(key, value)` pair exactly.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
        filters: &[(String, Value)],
    ) -> Result<Vec<SearchHit>, AppError>;

    /// Fetch a single entry by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredEntry>, AppError>;

    /// All entry ids in a collection.
    async fn ids(&self, collection: &str) -> Result<Vec<String>, AppError>;

    async fn count(&self, collection: &str) -> Result<usize, AppError>;

    /// Delete every entry in a collection.
    async fn clear(&self, collection: &str) -> Result<(), AppError>;
}
