//! Two-tier semantic index over course material.
//!
//! `store` defines the similarity-store capability, `sqlite` the default
//! backend, and `index` the catalog/content collections built on top.

pub mod index;
pub mod sqlite;
pub mod store;

pub use index::{ChunkMatch, IndexStats, SemanticIndex};
pub use sqlite::SqliteVectorStore;
pub use store::{SearchHit, StoredEntry, VectorStore};
