//! Vector stores holding reference question/answer pairs.
//!
//! The retriever only ever asks for the nearest neighbours of one embedding,
//! so the trait is deliberately small: add, search, count.

mod memory;
mod sqlite;
mod supabase;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;
pub use supabase::SupabaseVectorStore;

use crate::config::{credentials, Settings, VectorStoreProvider};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A document stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    /// Where the document came from, usually a benchmark task id.
    pub source: String,
    /// Page content that gets handed back to the model.
    pub content: String,
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            content: content.into(),
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store documents, returning how many were written.
    async fn add_documents(&self, docs: &[Document]) -> Result<usize>;

    /// Return up to `k` documents ordered by descending similarity.
    async fn similarity_search(&self, query_embedding: &[f32], k: usize)
        -> Result<Vec<SearchResult>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank documents against a query and keep the best `k`.
pub(crate) fn rank(
    query_embedding: &[f32],
    docs: impl Iterator<Item = Document>,
    k: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = docs
        .map(|document| SearchResult {
            score: cosine_similarity(query_embedding, &document.embedding),
            document,
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(k);
    results
}

/// Build the vector store selected in the settings.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
        VectorStoreProvider::Supabase => {
            let url = settings.vector_store.supabase_url.clone().ok_or_else(|| {
                SvarError::Config(
                    "vector_store.supabase_url is not set (or export SUPABASE_URL)".to_string(),
                )
            })?;
            let key = credentials::supabase_service_key(credentials::env_lookup)?;
            Arc::new(SupabaseVectorStore::new(
                &url,
                &key,
                &settings.vector_store.table_name,
                &settings.vector_store.query_name,
            )?)
        }
        VectorStoreProvider::Sqlite => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
    };
    Ok(store)
}
