//! Loading reference pairs into a vector store.

use super::SimilarExample;
use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use crate::vector_store::{Document, VectorStore};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const EMBED_BATCH: usize = 32;

/// One line of a reference JSONL file.
///
/// Accepts both the benchmark metadata spelling (`Question`, `Final answer`)
/// and plain snake_case keys.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReferenceRecord {
    pub task_id: String,
    #[serde(alias = "Question")]
    pub question: String,
    #[serde(alias = "Final answer")]
    pub final_answer: String,
}

/// Read every well-formed record from a JSONL file. Malformed lines are
/// skipped with a warning; blank lines are ignored.
pub fn load_reference_records(path: &Path) -> Result<Vec<ReferenceRecord>> {
    let text = std::fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ReferenceRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping line {} of {}: {}", line_no + 1, path.display(), e),
        }
    }

    if records.is_empty() {
        return Err(SvarError::InvalidInput(format!(
            "No reference records found in {}",
            path.display()
        )));
    }
    Ok(records)
}

/// Embeds reference pairs and writes them to a store.
pub struct ReferenceIndexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl ReferenceIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Index the records, calling `progress` with the running count after
    /// each batch. Returns the number of documents written.
    pub async fn index<F>(&self, records: &[ReferenceRecord], mut progress: F) -> Result<usize>
    where
        F: FnMut(usize),
    {
        let mut written = 0;

        for batch in records.chunks(EMBED_BATCH) {
            let contents: Vec<String> = batch
                .iter()
                .map(|r| SimilarExample::page_content_for(&r.question, &r.final_answer))
                .collect();
            let embeddings = self.embedder.embed_batch(&contents).await?;

            let docs: Vec<Document> = batch
                .iter()
                .zip(contents)
                .zip(embeddings)
                .map(|((record, content), embedding)| {
                    Document::new(record.task_id.clone(), content, embedding)
                })
                .collect();

            written += self.store.add_documents(&docs).await?;
            progress(written);
        }

        info!("Indexed {} reference pairs", written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::LetterEmbedder;
    use crate::vector_store::MemoryVectorStore;
    use std::io::Write;

    #[test]
    fn test_load_accepts_both_spellings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"task_id": "a", "Question": "Q1", "Level": 1, "Final answer": "A1"}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(
            file,
            r#"{{"task_id": "b", "question": "Q2", "final_answer": "A2"}}"#
        )
        .unwrap();

        let records = load_reference_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "Q1");
        assert_eq!(records[1].final_answer, "A2");
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_reference_records(file.path()).is_err());
    }

    #[tokio::test]
    async fn test_index_writes_page_content() {
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = ReferenceIndexer::new(Arc::new(LetterEmbedder), store.clone());
        let records: Vec<ReferenceRecord> = (0..40)
            .map(|i| ReferenceRecord {
                task_id: format!("t{}", i),
                question: format!("question {}", i),
                final_answer: i.to_string(),
            })
            .collect();

        let mut ticks = Vec::new();
        let written = indexer.index(&records, |n| ticks.push(n)).await.unwrap();

        assert_eq!(written, 40);
        assert_eq!(ticks, vec![32, 40]);
        assert_eq!(store.document_count().await.unwrap(), 40);
    }
}
