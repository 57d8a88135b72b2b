//! In-memory vector store, used by tests and one-off runs.

use super::{rank, Document, SearchResult, VectorStore};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> SvarError {
    SvarError::VectorStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_documents(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().map_err(poisoned)?;
        for doc in docs {
            store.retain(|existing| existing.id != doc.id);
            store.push(doc.clone());
        }
        Ok(docs.len())
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(rank(query_embedding, docs.iter().cloned(), k))
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.documents.read().map_err(poisoned)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let doc1 = Document::new("task-1", "Question : a\n\nFinal answer : 1", vec![1.0, 0.0, 0.0]);
        let doc2 = Document::new("task-2", "Question : b\n\nFinal answer : 2", vec![0.0, 1.0, 0.0]);

        store.add_documents(&[doc1.clone(), doc2]).await.unwrap();
        assert_eq!(store.document_count().await.unwrap(), 2);

        let results = store.similarity_search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].document.source, "task-1");

        // Re-adding the same id replaces instead of duplicating
        store.add_documents(&[doc1]).await.unwrap();
        assert_eq!(store.document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = MemoryVectorStore::new();
        let results = store.similarity_search(&[1.0], 1).await.unwrap();
        assert!(results.is_empty());
    }
}
