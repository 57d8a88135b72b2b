//! Similar-question retrieval.
//!
//! Reference question/answer pairs are stored as page content of the form
//! `Question : ...\n\nFinal answer : ...`. Before the model sees a new
//! question, the single closest pair is looked up and handed to it as an
//! in-context example.

mod index;

pub use index::{load_reference_records, ReferenceIndexer, ReferenceRecord};

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::{debug, instrument};

const QUESTION_MARKER: &str = "Question : ";
const ANSWER_MARKER: &str = "\n\nFinal answer : ";

/// A retrieved reference pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarExample {
    pub source: String,
    /// Raw page content exactly as stored.
    pub page_content: String,
    pub score: f32,
}

impl SimilarExample {
    /// Render a question/answer pair as stored page content.
    pub fn page_content_for(question: &str, answer: &str) -> String {
        format!("{}{}{}{}", QUESTION_MARKER, question, ANSWER_MARKER, answer)
    }
}

/// Finds the nearest reference pair for a question.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            k: 1,
        }
    }

    /// Number of neighbours requested from the store. Only the first is used.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    /// Look up the most similar stored pair, if the store holds any.
    #[instrument(skip(self, text))]
    pub async fn most_similar(&self, text: &str) -> Result<Option<SimilarExample>> {
        let embedding = self.embedder.embed(text).await?;
        let results = self.store.similarity_search(&embedding, self.k).await?;

        let best = results.into_iter().next().map(|r| SimilarExample {
            source: r.document.source,
            page_content: r.document.content,
            score: r.score,
        });

        match &best {
            Some(example) => debug!(source = %example.source, score = example.score, "Found similar example"),
            None => debug!("No similar example found"),
        }
        Ok(best)
    }
}
