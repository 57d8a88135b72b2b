//! Embedding generation for similarity search.

mod huggingface;
mod openai;

pub use huggingface::HuggingFaceEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{credentials, EmbeddingProvider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Build the embedder selected in the settings.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let creds =
        credentials::resolve_embedding_credentials(&settings.embedding, credentials::env_lookup)?;
    let dimensions = settings.embedding.dimensions as usize;

    let embedder: Arc<dyn Embedder> = match settings.embedding.provider {
        EmbeddingProvider::HuggingFace => Arc::new(HuggingFaceEmbedder::new(
            &creds,
            &settings.embedding.model,
            dimensions,
        )?),
        EmbeddingProvider::OpenAi => Arc::new(OpenAIEmbedder::with_config(
            &creds,
            &settings.embedding.model,
            dimensions,
        )?),
    };
    Ok(embedder)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic embedder for tests.

    use super::*;

    /// Embeds text as a bag-of-letters histogram, so texts sharing letters
    /// end up close together.
    pub struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut histogram = vec![0.0_f32; 26];
            for c in text.to_ascii_lowercase().chars() {
                if c.is_ascii_lowercase() {
                    histogram[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            Ok(histogram)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            26
        }
    }
}
